//! Target detector: cone test + dot fallback.
//!
//! # Алгоритм
//!
//! ```text
//! input == 0            → None
//! broad phase           → overlap_sphere(origin, radius, target_mask)
//! (line of sight)       → raycast должен попасть в сам candidate
//! narrow phase (cone)   → min angle, tie → distance, tie → scene-query order
//! fallback (dot)        → max dot(input, to_candidate) > dot_threshold
//! ```
//!
//! Pure функции, без ECS: система `process_attack_input` собирает
//! `TargetQuery` и scene query, детектор только считает.

use bevy::prelude::*;

use crate::config::{CombatConfig, ConeAxis};
use crate::targeting::scene_query::{SceneEntity, SceneQuery, SceneQueryError};

/// Минимальная длина вектора, которую считаем направлением
const DIRECTION_EPSILON: f32 = 1e-6;

#[derive(Debug, Clone, PartialEq)]
pub struct DetectorSettings {
    pub cone_half_angle_deg: f32,
    pub radius: f32,
    pub cone_axis: ConeAxis,
    pub dot_threshold: f32,
    pub angle_epsilon_deg: f32,
    pub distance_epsilon: f32,
    pub target_mask: u32,
    pub require_line_of_sight: bool,
    pub obstacle_mask: u32,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self::from(&CombatConfig::default())
    }
}

impl From<&CombatConfig> for DetectorSettings {
    fn from(config: &CombatConfig) -> Self {
        Self {
            cone_half_angle_deg: config.cone_half_angle_deg,
            radius: config.detection_radius,
            cone_axis: config.cone_axis,
            dot_threshold: config.dot_threshold,
            angle_epsilon_deg: config.angle_epsilon_deg,
            distance_epsilon: config.distance_epsilon,
            target_mask: config.target_mask,
            require_line_of_sight: config.require_line_of_sight,
            obstacle_mask: config.obstacle_mask,
        }
    }
}

/// Входные данные одного запроса
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetQuery {
    pub origin: Vec3,
    /// Facing direction атакующего
    pub forward: Vec3,
    /// Camera-relative input direction (world space)
    pub input_direction: Vec3,
    /// Сам атакующий (исключается из кандидатов)
    pub exclude: Option<Entity>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SelectionPhase {
    Cone,
    DotFallback { dot: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetSelection {
    pub entity: Entity,
    pub position: Vec3,
    pub angle_deg: f32,
    pub distance: f32,
    pub phase: SelectionPhase,
}

#[derive(Debug, Clone, Copy)]
struct Scored {
    candidate: SceneEntity,
    angle_deg: f32,
    distance: f32,
    direction: Vec3,
}

#[derive(Debug, Clone, Default)]
pub struct TargetDetector {
    pub settings: DetectorSettings,
}

impl TargetDetector {
    pub fn new(settings: DetectorSettings) -> Self {
        Self { settings }
    }

    /// Полный pipeline поверх scene query.
    ///
    /// Ошибка collaborator'а пробрасывается: система трактует её как
    /// "нет кандидатов на этом тике".
    pub fn select(
        &self,
        scene: &dyn SceneQuery,
        query: &TargetQuery,
    ) -> Result<Option<TargetSelection>, SceneQueryError> {
        if !has_direction(query.input_direction) {
            return Ok(None);
        }

        let mut candidates =
            scene.overlap_sphere(query.origin, self.settings.radius, self.settings.target_mask)?;

        if self.settings.require_line_of_sight {
            candidates = self.visible_candidates(scene, query.origin, candidates)?;
        }

        Ok(select_from_candidates(query, &self.settings, &candidates))
    }

    fn visible_candidates(
        &self,
        scene: &dyn SceneQuery,
        origin: Vec3,
        candidates: Vec<SceneEntity>,
    ) -> Result<Vec<SceneEntity>, SceneQueryError> {
        let mask = self.settings.target_mask | self.settings.obstacle_mask;
        let mut visible = Vec::with_capacity(candidates.len());

        for candidate in candidates {
            let to_candidate = candidate.position - origin;
            let distance = to_candidate.length();
            if distance <= DIRECTION_EPSILON {
                continue;
            }

            let hit = scene.raycast(origin, to_candidate, distance + self.settings.distance_epsilon, mask)?;
            if hit.is_some_and(|hit| hit.entity == candidate.entity) {
                visible.push(candidate);
            }
        }

        Ok(visible)
    }
}

/// Cone + dot fallback поверх готового списка кандидатов.
///
/// Порядок `candidates` = порядок scene query, он решает точные ничьи.
pub fn select_from_candidates(
    query: &TargetQuery,
    settings: &DetectorSettings,
    candidates: &[SceneEntity],
) -> Option<TargetSelection> {
    let input = query.input_direction.normalize_or_zero();
    if input.length_squared() <= DIRECTION_EPSILON {
        return None;
    }

    let axis = match settings.cone_axis {
        ConeAxis::Forward => query.forward.normalize_or_zero(),
        ConeAxis::Input => input,
    };
    // Нет facing direction → cone по input
    let axis = if has_direction(axis) { axis } else { input };

    let scored: Vec<Scored> = candidates
        .iter()
        .filter(|c| Some(c.entity) != query.exclude)
        .filter_map(|c| score(query.origin, axis, *c))
        .filter(|s| s.distance <= settings.radius)
        .collect();

    select_in_cone(&scored, settings).or_else(|| select_by_dot(&scored, input, settings))
}

/// `select_target(origin, forward, input, cone, radius, candidates)` с
/// дефолтными threshold'ами
pub fn select_target(
    origin: Vec3,
    forward: Vec3,
    input_direction: Vec3,
    cone_half_angle_deg: f32,
    radius: f32,
    candidates: &[SceneEntity],
) -> Option<Entity> {
    let settings = DetectorSettings {
        cone_half_angle_deg,
        radius,
        ..DetectorSettings::default()
    };
    let query = TargetQuery {
        origin,
        forward,
        input_direction,
        exclude: None,
    };

    select_from_candidates(&query, &settings, candidates).map(|s| s.entity)
}

fn has_direction(v: Vec3) -> bool {
    v.length_squared() > DIRECTION_EPSILON
}

fn score(origin: Vec3, axis: Vec3, candidate: SceneEntity) -> Option<Scored> {
    let to_candidate = candidate.position - origin;
    let distance = to_candidate.length();
    // Кандидат в точке origin не имеет направления
    if distance <= DIRECTION_EPSILON {
        return None;
    }
    let direction = to_candidate / distance;
    let cos = axis.dot(direction).clamp(-1.0, 1.0);

    Some(Scored {
        candidate,
        angle_deg: cos.acos().to_degrees(),
        distance,
        direction,
    })
}

/// Narrow phase: минимальный угол, потом дистанция, потом порядок
fn select_in_cone(scored: &[Scored], settings: &DetectorSettings) -> Option<TargetSelection> {
    let in_cone: Vec<&Scored> = scored
        .iter()
        .filter(|s| s.angle_deg <= settings.cone_half_angle_deg)
        .collect();

    let min_angle = in_cone
        .iter()
        .map(|s| s.angle_deg)
        .min_by(f32::total_cmp)?;

    let band: Vec<&Scored> = in_cone
        .into_iter()
        .filter(|s| s.angle_deg <= min_angle + settings.angle_epsilon_deg)
        .collect();

    let min_distance = band.iter().map(|s| s.distance).min_by(f32::total_cmp)?;

    band.into_iter()
        .find(|s| s.distance <= min_distance + settings.distance_epsilon)
        .map(|s| TargetSelection {
            entity: s.candidate.entity,
            position: s.candidate.position,
            angle_deg: s.angle_deg,
            distance: s.distance,
            phase: SelectionPhase::Cone,
        })
}

/// Fallback: лучший dot строго выше threshold, ничья → первый
fn select_by_dot(
    scored: &[Scored],
    input: Vec3,
    settings: &DetectorSettings,
) -> Option<TargetSelection> {
    let mut best: Option<(&Scored, f32)> = None;
    let mut best_dot = settings.dot_threshold;

    for s in scored {
        let dot = input.dot(s.direction);
        if dot > best_dot {
            best_dot = dot;
            best = Some((s, dot));
        }
    }

    best.map(|(s, dot)| TargetSelection {
        entity: s.candidate.entity,
        position: s.candidate.position,
        angle_deg: s.angle_deg,
        distance: s.distance,
        phase: SelectionPhase::DotFallback { dot },
    })
}
