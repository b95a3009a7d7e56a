//! Input-related компоненты: movement axis, input channel gate, crouch

use bevy::prelude::*;

/// Текущее значение 2D movement axis (пишет host input layer)
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct MovementAxis(pub Vec2);

/// World-space направление движения за этот тик (читает host character mover).
///
/// `Vec3::ZERO`, пока movement channel выключен.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Reflect)]
#[reflect(Component)]
pub struct MovementIntent(pub Vec3);

/// Gate для конфликтующих input каналов.
///
/// Атака выключает оба канала на время `Attacking`; completion и любой
/// cancel включают их обратно безусловно.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Reflect)]
#[reflect(Component)]
pub struct InputChannels {
    pub movement: bool,
    pub attack: bool,
}

impl Default for InputChannels {
    fn default() -> Self {
        Self {
            movement: true,
            attack: true,
        }
    }
}

impl InputChannels {
    pub fn disable_all(&mut self) {
        self.movement = false;
        self.attack = false;
    }

    pub fn enable_all(&mut self) {
        self.movement = true;
        self.attack = true;
    }

    pub fn all_enabled(&self) -> bool {
        self.movement && self.attack
    }
}

/// Crouch state + размеры capsule для обоих положений
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct CrouchState {
    pub crouching: bool,
    pub standing_height: f32,
    pub standing_center: Vec3,
    pub crouch_height: f32,
    pub crouch_center: Vec3,
}

impl Default for CrouchState {
    fn default() -> Self {
        Self {
            crouching: false,
            standing_height: 1.8,
            standing_center: Vec3::new(0.0, 0.9, 0.0),
            crouch_height: 1.0,
            crouch_center: Vec3::new(0.0, 0.5, 0.0),
        }
    }
}

impl CrouchState {
    pub fn toggle(&mut self) -> bool {
        self.crouching = !self.crouching;
        self.crouching
    }

    pub fn height(&self) -> f32 {
        if self.crouching {
            self.crouch_height
        } else {
            self.standing_height
        }
    }

    pub fn center(&self) -> Vec3 {
        if self.crouching {
            self.crouch_center
        } else {
            self.standing_center
        }
    }
}
