//! Tests for target detector (cone, tie-break, dot fallback, line of sight).

use bevy::prelude::*;

use super::detector::*;
use super::scene_query::*;
use crate::components::CombatLayers;
use crate::config::ConeAxis;

const FORWARD: Vec3 = Vec3::NEG_Z;

/// Кандидат на `angle_deg` вправо от forward (-Z) на дистанции `distance`
fn at_angle(index: u32, angle_deg: f32, distance: f32) -> SceneEntity {
    let rad = angle_deg.to_radians();
    SceneEntity {
        entity: Entity::from_raw(index),
        position: Vec3::new(rad.sin() * distance, 0.0, -rad.cos() * distance),
    }
}

fn query(input: Vec3) -> TargetQuery {
    TargetQuery {
        origin: Vec3::ZERO,
        forward: FORWARD,
        input_direction: input,
        exclude: None,
    }
}

fn settings(cone_half_angle_deg: f32, radius: f32) -> DetectorSettings {
    DetectorSettings {
        cone_half_angle_deg,
        radius,
        ..DetectorSettings::default()
    }
}

#[test]
fn test_smaller_angle_wins_over_distance() {
    let a = at_angle(1, 10.0, 3.0);
    let b = at_angle(2, 5.0, 8.0);

    let selected = select_target(Vec3::ZERO, FORWARD, FORWARD, 60.0, 10.0, &[a, b]);
    assert_eq!(selected, Some(b.entity));
}

#[test]
fn test_narrow_cone_excludes_wide_candidate() {
    let a = at_angle(1, 5.0, 3.0);
    let b = at_angle(2, 10.0, 8.0);

    let selection = select_from_candidates(&query(FORWARD), &settings(8.0, 10.0), &[a, b])
        .expect("A inside cone");

    assert_eq!(selection.entity, a.entity);
    assert_eq!(selection.phase, SelectionPhase::Cone);
}

#[test]
fn test_zero_input_returns_none() {
    let a = at_angle(1, 0.0, 2.0);
    assert_eq!(
        select_target(Vec3::ZERO, FORWARD, Vec3::ZERO, 60.0, 10.0, &[a]),
        None
    );
}

#[test]
fn test_no_candidates_returns_none() {
    assert_eq!(select_target(Vec3::ZERO, FORWARD, FORWARD, 60.0, 10.0, &[]), None);
}

#[test]
fn test_out_of_radius_ignored() {
    let far = at_angle(1, 0.0, 12.0);
    assert_eq!(select_target(Vec3::ZERO, FORWARD, FORWARD, 60.0, 10.0, &[far]), None);
}

#[test]
fn test_equal_angle_closer_wins() {
    let far = at_angle(1, 10.0, 5.0);
    let near = at_angle(2, -10.0, 3.0);

    assert_eq!(
        select_target(Vec3::ZERO, FORWARD, FORWARD, 30.0, 10.0, &[far, near]),
        Some(near.entity)
    );
}

#[test]
fn test_angle_within_epsilon_is_tie() {
    // 10.05° vs 10.0°: разница меньше angle_epsilon (0.1°), решает дистанция
    let wider_near = at_angle(1, 10.05, 3.0);
    let narrow_far = at_angle(2, 10.0, 6.0);

    assert_eq!(
        select_target(Vec3::ZERO, FORWARD, FORWARD, 30.0, 10.0, &[narrow_far, wider_near]),
        Some(wider_near.entity)
    );
}

#[test]
fn test_exact_tie_keeps_query_order() {
    let left = at_angle(1, -10.0, 3.0);
    let right = at_angle(2, 10.0, 3.0);

    assert_eq!(
        select_target(Vec3::ZERO, FORWARD, FORWARD, 30.0, 10.0, &[left, right]),
        Some(left.entity)
    );
    assert_eq!(
        select_target(Vec3::ZERO, FORWARD, FORWARD, 30.0, 10.0, &[right, left]),
        Some(right.entity)
    );
}

#[test]
fn test_dot_fallback_outside_cone() {
    // 70° от forward: вне cone 30°, но input смотрит прямо на кандидата
    let side = at_angle(1, 70.0, 3.0);
    let input = side.position.normalize();

    let selection = select_from_candidates(&query(input), &settings(30.0, 5.0), &[side])
        .expect("fallback picks side candidate");

    assert_eq!(selection.entity, side.entity);
    assert!(matches!(selection.phase, SelectionPhase::DotFallback { dot } if dot > 0.99));
}

#[test]
fn test_dot_fallback_below_threshold() {
    // cos(70°) ≈ 0.34 < 0.5
    let side = at_angle(1, 70.0, 3.0);
    assert!(select_from_candidates(&query(FORWARD), &settings(30.0, 5.0), &[side]).is_none());
}

#[test]
fn test_cone_axis_input() {
    let right = SceneEntity {
        entity: Entity::from_raw(1),
        position: Vec3::new(3.0, 0.0, 0.0),
    };
    let mut settings = settings(30.0, 5.0);
    settings.cone_axis = ConeAxis::Input;

    let selection =
        select_from_candidates(&query(Vec3::X), &settings, &[right]).expect("in input cone");
    assert_eq!(selection.phase, SelectionPhase::Cone);
}

#[test]
fn test_attacker_and_coincident_candidates_excluded() {
    let me = SceneEntity {
        entity: Entity::from_raw(1),
        position: Vec3::new(0.0, 0.0, -1.0),
    };
    let on_top = SceneEntity {
        entity: Entity::from_raw(2),
        position: Vec3::ZERO,
    };
    let mut q = query(FORWARD);
    q.exclude = Some(me.entity);

    assert!(select_from_candidates(&q, &settings(30.0, 5.0), &[me, on_top]).is_none());
}

#[test]
fn test_selection_is_idempotent() {
    let candidates = [
        at_angle(1, 12.0, 4.0),
        at_angle(2, -12.0, 4.0),
        at_angle(3, 3.0, 9.0),
    ];
    let settings = settings(30.0, 10.0);

    let first = select_from_candidates(&query(FORWARD), &settings, &candidates);
    let second = select_from_candidates(&query(FORWARD), &settings, &candidates);
    assert_eq!(first, second);
    assert_eq!(first.map(|s| s.entity), Some(Entity::from_raw(3)));
}

fn blocked_scene() -> TransformSceneQuery {
    TransformSceneQuery::new(vec![
        SceneProxy {
            entity: Entity::from_raw(1),
            position: Vec3::new(0.0, 0.0, -3.0),
            radius: 0.5,
            layers: CombatLayers::ENEMY,
        },
        SceneProxy {
            entity: Entity::from_raw(2),
            position: Vec3::new(0.0, 0.0, -1.5),
            radius: 0.5,
            layers: CombatLayers::OBSTACLE,
        },
    ])
}

#[test]
fn test_detector_over_scene_query() {
    let detector = TargetDetector::default();
    let selection = detector
        .select(&blocked_scene(), &query(FORWARD))
        .expect("scene query ok");

    assert_eq!(selection.map(|s| s.entity), Some(Entity::from_raw(1)));
}

#[test]
fn test_line_of_sight_discards_occluded() {
    let mut settings = DetectorSettings::default();
    settings.require_line_of_sight = true;
    let detector = TargetDetector::new(settings);

    let selection = detector
        .select(&blocked_scene(), &query(FORWARD))
        .expect("scene query ok");
    assert!(selection.is_none());
}

struct BrokenScene;

impl SceneQuery for BrokenScene {
    fn overlap_sphere(
        &self,
        _center: Vec3,
        _radius: f32,
        _filter_mask: u32,
    ) -> Result<Vec<SceneEntity>, SceneQueryError> {
        Err(SceneQueryError::Unavailable("physics offline".to_string()))
    }

    fn raycast(
        &self,
        _origin: Vec3,
        _direction: Vec3,
        _max_distance: f32,
        _filter_mask: u32,
    ) -> Result<Option<RaycastHit>, SceneQueryError> {
        Err(SceneQueryError::Unavailable("physics offline".to_string()))
    }
}

#[test]
fn test_scene_query_failure_propagates() {
    let detector = TargetDetector::default();
    assert!(detector.select(&BrokenScene, &query(FORWARD)).is_err());

    // Нулевой input: scene query даже не вызывается
    assert_eq!(detector.select(&BrokenScene, &query(Vec3::ZERO)), Ok(None));
}
