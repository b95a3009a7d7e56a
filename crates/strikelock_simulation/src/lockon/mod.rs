//! Lock-on: persistent target among trigger-volume candidates.
//!
//! Host сообщает enter/exit своего trigger volume (`TriggerVolumeEvent`),
//! игрок переключает lock-on (`PlayerInputEvent::LockOnToggled`). Camera
//! framing (`ActiveCamera`) переключается FreeOrbit ↔ TargetFollow.

use bevy::ecs::entity::Entities;
use bevy::prelude::*;

pub mod controller;

pub use controller::{LockOnChange, LockOnController};

use crate::combat::CombatSet;
use crate::components::CombatLayers;
use crate::config::CombatConfig;
use crate::input::PlayerInputEvent;
use crate::shared::{ActiveCamera, CameraFrame, CameraFramingChanged, CameraMode};

/// Trigger volume вокруг `observer` (host physics → ECS)
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerVolumeEvent {
    Entered { observer: Entity, entity: Entity },
    Exited { observer: Entity, entity: Entity },
}

/// Применить изменение lock-on к camera framing
fn apply_framing(
    observer: Entity,
    change: LockOnChange,
    camera: &mut ActiveCamera,
    framing: &mut EventWriter<CameraFramingChanged>,
) {
    let mode = match change {
        LockOnChange::Locked(target) => CameraMode::TargetFollow { target },
        LockOnChange::Released(_) => CameraMode::FreeOrbit,
        LockOnChange::Unchanged => return,
    };

    camera.mode = mode;
    framing.write(CameraFramingChanged {
        entity: observer,
        mode,
    });

    crate::logger::log(&format!("🎯 Lock-on {:?}: {:?}", observer, change));
}

/// System: enter/exit trigger volume → candidate set.
///
/// Кандидаты фильтруются по `target_mask` (entity без `CombatLayers`
/// не может быть целью).
pub fn apply_trigger_volume_events(
    mut events: EventReader<TriggerVolumeEvent>,
    mut observers: Query<(&mut LockOnController, &mut ActiveCamera)>,
    layers: Query<&CombatLayers>,
    config: Res<CombatConfig>,
    mut framing: EventWriter<CameraFramingChanged>,
) {
    for event in events.read() {
        match *event {
            TriggerVolumeEvent::Entered { observer, entity } => {
                let is_target = layers
                    .get(entity)
                    .is_ok_and(|layers| layers.matches(config.target_mask));
                if !is_target {
                    continue;
                }
                if let Ok((mut controller, _)) = observers.get_mut(observer) {
                    controller.on_enter(entity);
                }
            }
            TriggerVolumeEvent::Exited { observer, entity } => {
                let Ok((mut controller, mut camera)) = observers.get_mut(observer) else {
                    continue;
                };
                let change = controller.on_exit(entity);
                apply_framing(observer, change, &mut camera, &mut framing);
            }
        }
    }
}

/// System: убрать despawned кандидатов/target (liveness check)
pub fn prune_lock_on_targets(
    mut observers: Query<(Entity, &mut LockOnController, &mut ActiveCamera)>,
    entities: &Entities,
    mut framing: EventWriter<CameraFramingChanged>,
) {
    for (observer, mut controller, mut camera) in observers.iter_mut() {
        if controller.candidates().iter().all(|e| entities.contains(*e)) {
            continue;
        }
        let change = controller.retain_alive(|entity| entities.contains(entity));
        apply_framing(observer, change, &mut camera, &mut framing);
    }
}

/// System: `LockOnToggled` → выбрать/отпустить target
pub fn toggle_lock_on(
    mut inputs: EventReader<PlayerInputEvent>,
    mut observers: Query<(&Transform, &mut LockOnController, &mut ActiveCamera)>,
    positions: Query<&Transform>,
    camera_frame: Res<CameraFrame>,
    mut framing: EventWriter<CameraFramingChanged>,
) {
    for input in inputs.read() {
        let PlayerInputEvent::LockOnToggled { entity: observer } = *input else {
            continue;
        };
        let Ok((transform, mut controller, mut camera)) = observers.get_mut(observer) else {
            continue;
        };

        let change = controller.toggle(transform.translation, camera_frame.forward, |entity| {
            positions.get(entity).ok().map(|t| t.translation)
        });
        if change == LockOnChange::Unchanged {
            crate::logger::log(&format!("Lock-on toggle ignored for {:?}: no candidates", observer));
        }
        apply_framing(observer, change, &mut camera, &mut framing);
    }
}

/// Lock-on Plugin
///
/// Порядок: trigger volume events → prune → toggle (все в `CombatSet::LockOn`).
pub struct LockOnPlugin;

impl Plugin for LockOnPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<TriggerVolumeEvent>()
            .add_event::<CameraFramingChanged>()
            .add_event::<PlayerInputEvent>();

        app.add_systems(
            FixedUpdate,
            (apply_trigger_volume_events, prune_lock_on_targets, toggle_lock_on)
                .chain()
                .in_set(CombatSet::LockOn),
        );
    }
}
