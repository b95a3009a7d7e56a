//! Camera frame + framing mode.
//!
//! ECS не владеет камерой: host каждый кадр пишет ориентацию в `CameraFrame`,
//! а framing mode (`ActiveCamera`) переключает lock-on.

use bevy::prelude::*;

/// Ориентация активной камеры (заполняется host'ом).
///
/// Используется для перевода 2D input axis в world direction
/// и для lock-on selection (угол между forward камеры и кандидатом).
#[derive(Resource, Debug, Clone, Copy)]
pub struct CameraFrame {
    pub forward: Vec3,
    pub right: Vec3,
}

impl Default for CameraFrame {
    fn default() -> Self {
        Self {
            forward: Vec3::NEG_Z,
            right: Vec3::X,
        }
    }
}

impl CameraFrame {
    pub fn new(forward: Vec3, right: Vec3) -> Self {
        Self { forward, right }
    }

    /// Camera-relative направление на плоскости XZ.
    ///
    /// `axis.y`: вперёд/назад, `axis.x`: вбок. Результат нормализован
    /// (или `Vec3::ZERO`, если input нулевой либо камера смотрит строго вниз).
    pub fn world_direction(&self, axis: Vec2) -> Vec3 {
        let forward = flatten(self.forward);
        let right = flatten(self.right);
        (forward * axis.y + right * axis.x).normalize_or_zero()
    }
}

/// Проекция на ground plane (Y = 0) с нормализацией.
pub fn flatten(direction: Vec3) -> Vec3 {
    Vec3::new(direction.x, 0.0, direction.z).normalize_or_zero()
}

/// Camera framing mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraMode {
    /// Свободная orbit камера (lock-on выключен)
    FreeOrbit,

    /// Камера следует за lock-on целью
    TargetFollow { target: Entity },
}

/// Active camera framing component
///
/// Attached к player entity. Host читает `mode` (или `CameraFramingChanged`
/// event) и переключает свои virtual cameras.
#[derive(Component, Debug, Clone, Copy)]
pub struct ActiveCamera {
    pub mode: CameraMode,
}

impl Default for ActiveCamera {
    fn default() -> Self {
        Self {
            mode: CameraMode::FreeOrbit,
        }
    }
}

impl ActiveCamera {
    pub fn is_following(&self) -> bool {
        matches!(self.mode, CameraMode::TargetFollow { .. })
    }
}

/// Event: framing mode сменился (ECS → host camera rig)
#[derive(Event, Debug, Clone, PartialEq)]
pub struct CameraFramingChanged {
    pub entity: Entity,
    pub mode: CameraMode,
}
