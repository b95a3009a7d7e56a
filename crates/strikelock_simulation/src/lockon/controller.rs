use std::collections::HashSet;

use bevy::prelude::*;

/// Результат toggle/exit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockOnChange {
    Locked(Entity),
    Released(Entity),
    Unchanged,
}

/// Lock-on state персонажа.
///
/// Кандидаты приходят из trigger volume (enter/exit). Target держится,
/// пока lock-on не выключат, кандидат не выйдет из volume или не исчезнет.
#[derive(Component, Debug, Clone, Default)]
pub struct LockOnController {
    candidates: HashSet<Entity>,
    target: Option<Entity>,
}

impl LockOnController {
    pub fn target(&self) -> Option<Entity> {
        self.target
    }

    pub fn is_locked(&self) -> bool {
        self.target.is_some()
    }

    pub fn candidates(&self) -> &HashSet<Entity> {
        &self.candidates
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.candidates.contains(&entity)
    }

    /// Candidate вошёл в trigger volume. true если новый
    pub fn on_enter(&mut self, entity: Entity) -> bool {
        self.candidates.insert(entity)
    }

    /// Candidate вышел из volume (или исчез). Если это был target: release.
    pub fn on_exit(&mut self, entity: Entity) -> LockOnChange {
        self.candidates.remove(&entity);
        if self.target == Some(entity) {
            self.target = None;
            return LockOnChange::Released(entity);
        }
        LockOnChange::Unchanged
    }

    pub fn release(&mut self) -> LockOnChange {
        match self.target.take() {
            Some(previous) => LockOnChange::Released(previous),
            None => LockOnChange::Unchanged,
        }
    }

    /// Toggle lock-on.
    ///
    /// Включение: кандидат с минимальным углом между camera forward и
    /// направлением на него; равные углы → меньший entity index.
    /// Пустой set (или нет позиций) → no-op.
    pub fn toggle(
        &mut self,
        origin: Vec3,
        camera_forward: Vec3,
        position_of: impl Fn(Entity) -> Option<Vec3>,
    ) -> LockOnChange {
        if self.target.is_some() {
            return self.release();
        }

        let mut ordered: Vec<Entity> = self.candidates.iter().copied().collect();
        ordered.sort_by_key(|entity| entity.index());

        let mut best: Option<(Entity, f32)> = None;
        for entity in ordered {
            let Some(position) = position_of(entity) else {
                continue;
            };
            let to_candidate = position - origin;
            if to_candidate.length_squared() <= f32::EPSILON {
                continue;
            }
            let angle = camera_forward.angle_between(to_candidate);
            if best.map_or(true, |(_, best_angle)| angle < best_angle) {
                best = Some((entity, angle));
            }
        }

        match best {
            Some((entity, _)) => {
                self.target = Some(entity);
                LockOnChange::Locked(entity)
            }
            None => LockOnChange::Unchanged,
        }
    }

    /// Выкинуть кандидатов, которых больше нет в мире
    pub fn retain_alive(&mut self, is_alive: impl Fn(Entity) -> bool) -> LockOnChange {
        self.candidates.retain(|entity| is_alive(*entity));
        match self.target {
            Some(target) if !is_alive(target) => {
                self.target = None;
                LockOnChange::Released(target)
            }
            _ => LockOnChange::Unchanged,
        }
    }
}
