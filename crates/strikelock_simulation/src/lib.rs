//! STRIKELOCK Simulation Core
//!
//! Melee targeting + attack sequencing на Bevy 0.16 ECS (headless).
//!
//! ECS = gameplay state (target selection, attack lifecycle, lock-on).
//! Host = rendering, animation, physics, device input: общается только
//! через events (`PlayerInputEvent`, `AnimationCommand`, `AnimationSignal`,
//! `CombatEvent`) и пару resources (`CameraFrame`, `SceneQueryOverride`).

use std::time::Duration;

use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// Публичные модули
pub mod combat;
pub mod components;
pub mod config;
pub mod input;
pub mod lockon;
pub mod logger;
pub mod shared;
pub mod targeting;

// Re-export базовых типов для удобства
pub use combat::{
    AnimationCommand, AnimationSignal, AttackRejection, AttackTimeline, CombatEvent,
    CombatInterrupt, CombatPlugin, CombatSession, CombatSet, CombatState, DamageDealt,
    InterruptReason, StaggerState,
};
pub use components::*;
pub use config::{AttackSequencing, CombatConfig, ConeAxis, ConfigError, SignalSource};
pub use input::{CrouchChanged, InputPlugin, PlayerInputEvent};
pub use lockon::{LockOnController, LockOnPlugin, TriggerVolumeEvent};
pub use logger::init_logger;
pub use shared::{ActiveCamera, CameraFrame, CameraFramingChanged, CameraMode};
pub use targeting::{SceneQuery, SceneQueryError, SceneQueryOverride, TargetDetector};

/// Главный plugin симуляции (объединяет все подсистемы)
///
/// Resources, которые host уже вставил (config, RNG, camera), не
/// перезаписываются.
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        let config = app
            .world()
            .get_resource::<CombatConfig>()
            .cloned()
            .unwrap_or_default();
        let config = match config.validate() {
            Ok(()) => config,
            Err(error) => {
                logger::log_error(&format!("❌ {} (falling back to defaults)", error));
                CombatConfig::default()
            }
        };

        app
            // Fixed timestep из config (60Hz по умолчанию)
            .insert_resource(Time::<Fixed>::from_hz(config.tick_rate_hz))
            .init_resource::<CameraFrame>()
            .insert_resource(config);

        // Детерминистичный RNG (seed по умолчанию, если host не задал свой)
        if !app.world().contains_resource::<DeterministicRng>() {
            app.insert_resource(DeterministicRng::new(42));
        }

        app.add_plugins((InputPlugin, LockOnPlugin, CombatPlugin));
    }
}

/// Детерминистичный RNG resource (seeded)
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

/// Создаёт Bevy App для headless симуляции (без plugins)
///
/// Время двигается вручную через `step_simulation`, поэтому прогон
/// воспроизводим независимо от wall clock.
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    init_logger();
    app.insert_resource(DeterministicRng::new(seed))
        .insert_resource(Time::<Fixed>::from_hz(60.0)); // 60Hz FixedUpdate

    app
}

/// Один fixed тик длиной `delta`
pub fn step_simulation(app: &mut App, delta: Duration) {
    app.world_mut()
        .resource_mut::<Time<Fixed>>()
        .advance_by(delta);
    app.world_mut().run_schedule(FixedUpdate);
}

/// `ticks` fixed тиков по текущему timestep
pub fn step_fixed_ticks(app: &mut App, ticks: usize) {
    let timestep = app.world().resource::<Time<Fixed>>().timestep();
    for _ in 0..ticks {
        step_simulation(app, timestep);
    }
}

/// Snapshot мира для сравнения детерминизма
pub fn world_snapshot<T: Component>(world: &mut World) -> Vec<u8>
where
    T: std::fmt::Debug,
{
    let mut snapshot = Vec::new();

    let mut query = world.query::<(Entity, &T)>();
    let mut entities: Vec<_> = query.iter(world).collect();

    // Сортируем по Entity ID для детерминизма
    entities.sort_by_key(|(entity, _)| entity.index());

    for (entity, component) in entities {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", component).as_bytes());
    }

    snapshot
}
