//! Player input boundary (host input layer → ECS).
//!
//! Host биндит устройства сам и шлёт дискретные действия как
//! `PlayerInputEvent`; непрерывный movement axis пишется в `MovementAxis`.

use bevy::prelude::*;

use crate::combat::CombatSet;
use crate::components::{CrouchState, InputChannels, MeleeFighter, MovementAxis, MovementIntent};
use crate::shared::CameraFrame;

/// Дискретные действия игрока
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerInputEvent {
    AttackPressed { entity: Entity },
    CrouchToggled { entity: Entity },
    LockOnToggled { entity: Entity },
}

/// Event: crouch переключён (host меняет capsule)
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct CrouchChanged {
    pub entity: Entity,
    pub crouching: bool,
    pub height: f32,
    pub center: Vec3,
}

/// System: `CrouchToggled` → CrouchState.
///
/// Crouch идёт через movement channel: во время атаки toggle игнорируется.
pub fn toggle_crouch(
    mut inputs: EventReader<PlayerInputEvent>,
    mut fighters: Query<(&mut CrouchState, &InputChannels), With<MeleeFighter>>,
    mut crouch_events: EventWriter<CrouchChanged>,
) {
    for input in inputs.read() {
        let PlayerInputEvent::CrouchToggled { entity } = *input else {
            continue;
        };
        let Ok((mut crouch, channels)) = fighters.get_mut(entity) else {
            continue;
        };
        if !channels.movement {
            crate::logger::log(&format!("Crouch toggle ignored for {:?}: movement disabled", entity));
            continue;
        }

        let crouching = crouch.toggle();
        crouch_events.write(CrouchChanged {
            entity,
            crouching,
            height: crouch.height(),
            center: crouch.center(),
        });
    }
}

/// System: MovementAxis → camera-relative MovementIntent (с учётом gate)
pub fn update_movement_intent(
    mut fighters: Query<(&MovementAxis, &InputChannels, &mut MovementIntent), With<MeleeFighter>>,
    camera: Res<CameraFrame>,
) {
    for (axis, channels, mut intent) in fighters.iter_mut() {
        let direction = if channels.movement {
            camera.world_direction(axis.0)
        } else {
            Vec3::ZERO
        };
        intent.set_if_neq(MovementIntent(direction));
    }
}

/// Input Plugin
pub struct InputPlugin;

impl Plugin for InputPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<PlayerInputEvent>()
            .add_event::<CrouchChanged>();

        app.add_systems(
            FixedUpdate,
            (toggle_crouch, update_movement_intent)
                .chain()
                .in_set(CombatSet::Input),
        );
    }
}
