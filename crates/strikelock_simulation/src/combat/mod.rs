//! Combat module: attack timeline, approach motion, session state machine.
//!
//! ECS ответственность:
//! - Target selection (TargetDetector) и старт атаки
//! - Attack lifecycle: Idle → Attacking → Cooldown/ComboWindow → Idle
//! - Approach motion (пишет Transform) и contact → damage
//!
//! Host ответственность:
//! - Animation driver: исполняет `AnimationCommand`, опционально шлёт `AnimationSignal`
//! - Input: `PlayerInputEvent`, `MovementAxis`, `CameraFrame`
//! - VFX/UI: читает `CombatEvent`, `DamageDealt`

use bevy::prelude::*;

pub mod components;
pub mod events;
pub mod motion;
pub mod systems;
pub mod timeline;

// Re-export основных типов
pub use components::{
    AttackPlan, AttackRejection, CombatSession, CombatState, ContactOrder, SessionSignals,
    StaggerState,
};
pub use events::{
    AnimationCommand, AnimationSignal, CombatEvent, CombatInterrupt, ContactReached,
    DamageDealt, InterruptReason,
};
pub use motion::{approach_destination, ApproachMotion, Easing, TIME_EPSILON};
pub use timeline::{
    derive_metadata, AttackClip, AttackClipMetadata, AttackContent, AttackDefinition,
    AttackTimeline, ClipMarker, DefinitionError, MetadataCache, TimelineSettings,
};

use crate::input::PlayerInputEvent;

/// Порядок фаз одного fixed тика
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CombatSet {
    /// Stagger/hit reaction таймеры, interrupts, crouch
    Input,
    /// Motion + timeline сигналы
    Sessions,
    /// Contact → damage
    Resolution,
    /// Trigger volumes, lock-on toggle
    LockOn,
    /// Attack input: selection, затем Idle → Attacking
    Attack,
}

/// Combat Plugin
///
/// Регистрирует combat системы в FixedUpdate.
///
/// Порядок выполнения:
/// 1. tick_stagger_states / tick_hit_reactions: таймеры
/// 2. process_interrupts: отмена атак (снятие MeleeFighter: hook `on_fighter_removed`)
/// 3. advance_combat_sessions: motion, contact, completion, cooldown
/// 4. apply_animation_signals → resolve_contacts: урон
/// 5. process_attack_input: новая атака (первый advance на следующем тике)
pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        // Регистрация событий
        app.add_event::<PlayerInputEvent>()
            .add_event::<AnimationCommand>()
            .add_event::<AnimationSignal>()
            .add_event::<CombatInterrupt>()
            .add_event::<ContactReached>()
            .add_event::<DamageDealt>()
            .add_event::<CombatEvent>();

        app.configure_sets(
            FixedUpdate,
            (
                CombatSet::Input,
                CombatSet::Sessions,
                CombatSet::Resolution,
                CombatSet::LockOn,
                CombatSet::Attack,
            )
                .chain(),
        );

        app.add_systems(
            FixedUpdate,
            (
                (
                    systems::tick_stagger_states,
                    systems::tick_hit_reactions,
                    systems::process_interrupts,
                )
                    .chain()
                    .in_set(CombatSet::Input),
                systems::advance_combat_sessions.in_set(CombatSet::Sessions),
                (systems::apply_animation_signals, systems::resolve_contacts)
                    .chain()
                    .in_set(CombatSet::Resolution),
                systems::process_attack_input.in_set(CombatSet::Attack),
            ),
        );
    }
}
