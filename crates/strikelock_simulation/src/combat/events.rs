//! Combat events.
//!
//! # Boundary
//!
//! ```text
//! host animation driver ──AnimationSignal──▶ ECS
//! ECS ──AnimationCommand──▶ host animation driver
//! host gameplay ──CombatInterrupt──▶ ECS
//! ECS ──CombatEvent / DamageDealt──▶ host (UI, VFX, sound)
//! ```

use bevy::prelude::*;

use crate::combat::components::{AttackRejection, ContactOrder};

/// ECS → animation driver
#[derive(Event, Debug, Clone, PartialEq)]
pub enum AnimationCommand {
    /// Выбрать variant атаки (AttackIndex)
    SetVariant { entity: Entity, variant: usize },
    /// Fire animation trigger ("Attack")
    Trigger { entity: Entity, name: String },
    /// Прервать attack animation + approach
    Cancel { entity: Entity },
}

/// Animation driver → ECS (учитывается при `SignalSource::AnimationDriver`)
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationSignal {
    /// Contact marker в активном клипе
    Contact { entity: Entity },
    /// Клип доигран
    AttackComplete { entity: Entity },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InterruptReason {
    /// Внешний stagger override
    Stagger { duration: f32, source: Option<Entity> },
    /// Персонаж выключен/удаляется
    Disabled,
}

/// Внешнее прерывание атаки
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct CombatInterrupt {
    pub entity: Entity,
    pub reason: InterruptReason,
}

/// Событие: урон нанесён
#[derive(Event, Debug, Clone, PartialEq)]
pub struct DamageDealt {
    pub attacker: Entity,
    pub target: Entity,
    pub damage: u32,
    pub hit_point: Vec3,
    pub target_died: bool,
}

/// Lifecycle события атаки (observability для host'а)
#[derive(Event, Debug, Clone, PartialEq)]
pub enum CombatEvent {
    AttackStarted {
        attacker: Entity,
        target: Entity,
        variant: usize,
        destination: Vec3,
        contact_time: f32,
        total_duration: f32,
    },
    Contact {
        attacker: Entity,
        target: Entity,
    },
    /// Target исчез между selection и contact: урон пропущен
    TargetLost {
        attacker: Entity,
        target: Entity,
    },
    AttackCompleted {
        attacker: Entity,
    },
    CooldownElapsed {
        attacker: Entity,
    },
    ComboExpired {
        attacker: Entity,
    },
    AttackCancelled {
        attacker: Entity,
    },
    InputRejected {
        attacker: Entity,
        reason: AttackRejection,
    },
}

/// Contact дошёл до resolution (timeline или animation driver).
///
/// Внутреннее событие: Sessions → Resolution.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContactReached {
    pub attacker: Entity,
    pub order: ContactOrder,
}
