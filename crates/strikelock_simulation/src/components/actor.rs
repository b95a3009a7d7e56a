//! Базовые компоненты акторов: MeleeFighter, Damageable, CombatLayers

use bevy::prelude::*;

use crate::combat::systems::on_fighter_removed;
use crate::combat::CombatSession;
use crate::components::{CrouchState, InputChannels, MovementAxis, MovementIntent};
use crate::lockon::LockOnController;
use crate::shared::ActiveCamera;

/// Игрок/персонаж, который умеет атаковать в melee
///
/// Автоматически добавляет session, input gate, crouch, lock-on и camera
/// framing через Required Components. Снятие компонента отменяет атаку.
#[derive(Component, Debug, Clone, Default)]
#[require(
    Transform,
    CombatSession,
    InputChannels,
    MovementAxis,
    MovementIntent,
    CrouchState,
    LockOnController,
    ActiveCamera
)]
#[component(on_remove = on_fighter_removed)]
pub struct MeleeFighter;

/// Layer bits (аналог layer mask / tag фильтра scene query)
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Reflect)]
#[reflect(Component)]
pub struct CombatLayers(pub u32);

impl CombatLayers {
    pub const NONE: u32 = 0;
    pub const PLAYER: u32 = 1 << 0;
    pub const ENEMY: u32 = 1 << 1;
    pub const OBSTACLE: u32 = 1 << 2;
    pub const ALL: u32 = u32::MAX;

    pub fn matches(&self, mask: u32) -> bool {
        self.0 & mask != 0
    }
}

impl Default for CombatLayers {
    fn default() -> Self {
        Self(Self::ENEMY)
    }
}

/// Damageable capability (любой target, которому можно нанести урон)
pub trait DamageReceiver {
    /// Применить урон в точке попадания
    fn take_damage(&mut self, amount: u32, hit_point: Vec3);

    /// Играет ли сейчас hit reaction
    fn is_hit(&self) -> bool;
}

/// Здоровье + hit reaction цели
///
/// Инвариант: 0 ≤ health ≤ max_health
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
#[require(Transform, CombatLayers)]
pub struct Damageable {
    pub health: u32,
    pub max_health: u32,
    /// true пока играет hit reaction (повторный урон её не перезапускает)
    pub is_hit: bool,
    pub hit_reaction_remaining: f32,
    pub hit_reaction_duration: f32,
    /// Точка последнего попадания (для VFX host'а)
    pub last_hit_point: Option<Vec3>,
}

impl Default for Damageable {
    fn default() -> Self {
        Self::new(100)
    }
}

impl Damageable {
    pub fn new(max_health: u32) -> Self {
        Self {
            health: max_health,
            max_health,
            is_hit: false,
            hit_reaction_remaining: 0.0,
            hit_reaction_duration: 0.4,
            last_hit_point: None,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    /// Тик hit reaction таймера
    pub fn tick_reaction(&mut self, delta: f32) {
        if !self.is_hit {
            return;
        }
        self.hit_reaction_remaining -= delta;
        if self.hit_reaction_remaining <= 0.0 {
            self.hit_reaction_remaining = 0.0;
            self.is_hit = false;
        }
    }
}

impl DamageReceiver for Damageable {
    fn take_damage(&mut self, amount: u32, hit_point: Vec3) {
        self.health = self.health.saturating_sub(amount);
        self.last_hit_point = Some(hit_point);

        if !self.is_hit {
            self.is_hit = true;
            self.hit_reaction_remaining = self.hit_reaction_duration;
        }
    }

    fn is_hit(&self) -> bool {
        self.is_hit
    }
}
