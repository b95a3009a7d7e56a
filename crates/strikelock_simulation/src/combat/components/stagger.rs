use bevy::prelude::*;

/// Stagger state component (stunned после external interrupt).
///
/// Добавляется fighter'у при `InterruptReason::Stagger`.
/// Пока таймер > 0, attack input отклоняется.
#[derive(Component, Clone, Debug, Reflect)]
#[reflect(Component)]
pub struct StaggerState {
    /// Time remaining in stagger (seconds)
    pub timer: f32,

    /// Кто вызвал stagger (если известно)
    pub source: Option<Entity>,
}

impl StaggerState {
    pub fn new(duration: f32, source: Option<Entity>) -> Self {
        Self {
            timer: duration,
            source,
        }
    }

    pub fn is_staggered(&self) -> bool {
        self.timer > 0.0
    }
}
