//! Combat configuration resource.
//!
//! Дефолты повторяют authored значения контроллера персонажа
//! (approach 1.5m, cooldown 1s, detection radius 5m, cone 60°).
//! Host может загрузить override из RON (`CombatConfig::from_ron_str`).

use bevy::prelude::*;
use serde::Deserialize;

use crate::combat::Easing;
use crate::components::CombatLayers;

/// Ось, относительно которой считается cone test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum ConeAxis {
    /// Facing direction персонажа
    Forward,
    /// Camera-relative input direction
    Input,
}

/// Модель после завершения атаки
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum AttackSequencing {
    /// Idle → Attacking → Cooldown → Idle
    Cooldown,
    /// Idle → Attacking → ComboWindow → Idle
    Combo,
}

/// Кто генерирует contact/completion сигналы
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum SignalSource {
    /// Session сама отсчитывает contact_time / total_duration
    Timeline,
    /// Сигналы приходят от animation driver (`AnimationSignal`)
    AnimationDriver,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse combat config: {0}")]
    Parse(String),
    #[error("invalid combat config: {0}")]
    Invalid(String),
}

#[derive(Resource, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    // targeting
    pub detection_radius: f32,
    pub cone_half_angle_deg: f32,
    pub cone_axis: ConeAxis,
    pub dot_threshold: f32,
    pub angle_epsilon_deg: f32,
    pub distance_epsilon: f32,
    pub target_mask: u32,
    pub require_line_of_sight: bool,
    pub obstacle_mask: u32,

    // attack sequencing
    pub approach_distance: f32,
    pub approach_easing: Easing,
    pub attack_cooldown: f32,
    /// Сколько animation variants доступно; `None` = все атаки из timeline
    pub attack_variants: Option<usize>,
    pub sequencing: AttackSequencing,
    pub signal_source: SignalSource,
    pub attack_trigger: String,

    // content
    pub contact_marker: String,
    pub require_contact_marker: bool,

    // simulation
    pub tick_rate_hz: f64,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            detection_radius: 5.0,
            cone_half_angle_deg: 30.0,
            cone_axis: ConeAxis::Forward,
            dot_threshold: 0.5,
            angle_epsilon_deg: 0.1,
            distance_epsilon: 0.01,
            target_mask: CombatLayers::ENEMY,
            require_line_of_sight: false,
            obstacle_mask: CombatLayers::OBSTACLE,

            approach_distance: 1.5,
            approach_easing: Easing::OutQuad,
            attack_cooldown: 1.0,
            attack_variants: None,
            sequencing: AttackSequencing::Cooldown,
            signal_source: SignalSource::Timeline,
            attack_trigger: "Attack".to_string(),

            contact_marker: "OnContact".to_string(),
            require_contact_marker: false,

            tick_rate_hz: 60.0,
        }
    }
}

impl CombatConfig {
    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        let config: CombatConfig =
            ron::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.detection_radius > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "detection_radius must be positive, got {}",
                self.detection_radius
            )));
        }
        if !(0.0..=180.0).contains(&self.cone_half_angle_deg) {
            return Err(ConfigError::Invalid(format!(
                "cone_half_angle_deg must be in [0, 180], got {}",
                self.cone_half_angle_deg
            )));
        }
        if !(-1.0..=1.0).contains(&self.dot_threshold) {
            return Err(ConfigError::Invalid(format!(
                "dot_threshold must be in [-1, 1], got {}",
                self.dot_threshold
            )));
        }
        if self.approach_distance < 0.0 || self.attack_cooldown < 0.0 {
            return Err(ConfigError::Invalid(
                "approach_distance and attack_cooldown must not be negative".to_string(),
            ));
        }
        if !(self.tick_rate_hz > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "tick_rate_hz must be positive, got {}",
                self.tick_rate_hz
            )));
        }
        Ok(())
    }
}
