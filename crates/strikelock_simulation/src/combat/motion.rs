//! Approach motion: resumable eased interpolation.
//!
//! Заменяет tween: прогресс хранится как `elapsed / duration` и двигается
//! вызовами `advance(dt)`, поэтому motion заканчивается ровно через
//! `duration` секунд motion-времени независимо от частоты тиков.

use bevy::prelude::*;
use serde::Deserialize;

/// Допуск для накопленного f32 времени (чтобы сигнал не уехал на тик)
pub const TIME_EPSILON: f32 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Reflect)]
pub enum Easing {
    Linear,
    /// Decelerating: 1 - (1 - t)²
    #[default]
    OutQuad,
    /// Decelerating: 1 - (1 - t)³
    OutCubic,
}

impl Easing {
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::OutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            Easing::OutCubic => 1.0 - (1.0 - t).powi(3),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct ApproachMotion {
    pub from: Vec3,
    pub to: Vec3,
    pub duration: f32,
    pub elapsed: f32,
    pub easing: Easing,
}

impl ApproachMotion {
    pub fn new(from: Vec3, to: Vec3, duration: f32, easing: Easing) -> Self {
        Self {
            from,
            to,
            duration: duration.max(0.0),
            elapsed: 0.0,
            easing,
        }
    }

    /// Нормализованный прогресс по времени (до easing)
    pub fn progress(&self) -> f32 {
        if self.duration <= TIME_EPSILON {
            return 1.0;
        }
        let t = self.elapsed / self.duration;
        if self.elapsed + TIME_EPSILON >= self.duration {
            1.0
        } else {
            t.clamp(0.0, 1.0)
        }
    }

    pub fn is_finished(&self) -> bool {
        self.progress() >= 1.0
    }

    pub fn position(&self) -> Vec3 {
        let progress = self.progress();
        if progress >= 1.0 {
            // Snap: без float-хвоста от lerp
            return self.to;
        }
        self.from.lerp(self.to, self.easing.apply(progress))
    }

    /// Продвинуть motion на `delta` секунд, вернуть новую позицию
    pub fn advance(&mut self, delta: f32) -> Vec3 {
        self.elapsed = (self.elapsed + delta).min(self.duration);
        self.position()
    }
}

/// Точка остановки перед целью: `target − normalize(to_target) * distance`.
///
/// Если attacker стоит в точке цели: остаёмся на месте.
pub fn approach_destination(origin: Vec3, target: Vec3, approach_distance: f32) -> Vec3 {
    let to_target = target - origin;
    let direction = to_target.normalize_or_zero();
    if direction == Vec3::ZERO {
        return origin;
    }
    target - direction * approach_distance
}
