//! Property-based тесты target selection и session gate (proptest)

use bevy::prelude::*;
use proptest::prelude::*;
use strikelock_simulation::combat::{
    AttackClipMetadata, AttackPlan, CombatSession, CombatState, Easing,
};
use strikelock_simulation::config::{AttackSequencing, SignalSource};
use strikelock_simulation::targeting::{
    select_from_candidates, DetectorSettings, SceneEntity, SelectionPhase, TargetQuery,
};

const FORWARD: Vec3 = Vec3::NEG_Z;

fn candidates_strategy() -> impl Strategy<Value = Vec<SceneEntity>> {
    prop::collection::vec((-8.0f32..8.0, -8.0f32..8.0), 0..12).prop_map(|points| {
        points
            .into_iter()
            .enumerate()
            .map(|(i, (x, z))| SceneEntity {
                entity: Entity::from_raw(i as u32 + 1),
                position: Vec3::new(x, 0.0, z),
            })
            .collect()
    })
}

fn input_strategy() -> impl Strategy<Value = Vec3> {
    (-std::f32::consts::PI..std::f32::consts::PI)
        .prop_map(|yaw| Vec3::new(yaw.sin(), 0.0, -yaw.cos()))
}

fn query(input: Vec3) -> TargetQuery {
    TargetQuery {
        origin: Vec3::ZERO,
        forward: FORWARD,
        input_direction: input,
        exclude: None,
    }
}

fn angle_deg(position: Vec3) -> f32 {
    FORWARD.angle_between(position).to_degrees()
}

proptest! {
    #[test]
    fn zero_input_never_selects(candidates in candidates_strategy()) {
        let settings = DetectorSettings::default();
        prop_assert!(select_from_candidates(&query(Vec3::ZERO), &settings, &candidates).is_none());
    }

    #[test]
    fn selection_is_idempotent(candidates in candidates_strategy(), input in input_strategy()) {
        let settings = DetectorSettings::default();
        let first = select_from_candidates(&query(input), &settings, &candidates);
        let second = select_from_candidates(&query(input), &settings, &candidates);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn cone_selection_has_minimum_angle(
        candidates in candidates_strategy(),
        input in input_strategy(),
        cone in 1.0f32..90.0,
    ) {
        let settings = DetectorSettings {
            cone_half_angle_deg: cone,
            radius: 10.0,
            ..DetectorSettings::default()
        };
        let selection = select_from_candidates(&query(input), &settings, &candidates);

        let in_cone: Vec<&SceneEntity> = candidates
            .iter()
            .filter(|c| c.position.length() > 1e-3 && c.position.length() <= settings.radius)
            .filter(|c| angle_deg(c.position) <= cone)
            .collect();

        match selection {
            Some(selection) if selection.phase == SelectionPhase::Cone => {
                // Tolerance: angle epsilon + acos погрешность
                let tolerance = settings.angle_epsilon_deg + 1e-2;
                let min_angle = in_cone
                    .iter()
                    .map(|c| angle_deg(c.position))
                    .fold(f32::INFINITY, f32::min);

                for other in &in_cone {
                    let other_angle = angle_deg(other.position);
                    prop_assert!(selection.angle_deg <= other_angle + tolerance);
                    // Внутри tie band побеждает ближний
                    if other_angle <= min_angle + settings.angle_epsilon_deg - 1e-3 {
                        prop_assert!(
                            selection.distance
                                <= other.position.length() + settings.distance_epsilon + 1e-3
                        );
                    }
                }
            }
            Some(_) => {}
            None => {
                // Кандидаты у самой границы cone могут разойтись в float
                prop_assert!(in_cone.iter().all(|c| angle_deg(c.position) > cone - 1e-3));
            }
        }
    }

    #[test]
    fn fallback_respects_dot_threshold(
        candidates in candidates_strategy(),
        input in input_strategy(),
    ) {
        let settings = DetectorSettings {
            cone_half_angle_deg: 0.0,
            radius: 10.0,
            ..DetectorSettings::default()
        };
        let selection = select_from_candidates(&query(input), &settings, &candidates);

        let best_dot = candidates
            .iter()
            .filter(|c| c.position.length() > 1e-3 && c.position.length() <= settings.radius)
            .map(|c| input.dot(c.position.normalize()))
            .fold(f32::NEG_INFINITY, f32::max);

        match selection {
            Some(selection) => {
                if let SelectionPhase::DotFallback { dot } = selection.phase {
                    prop_assert!(dot > settings.dot_threshold);
                    prop_assert!((dot - best_dot).abs() < 1e-5);
                }
            }
            None => prop_assert!(best_dot <= settings.dot_threshold + 1e-5),
        }
    }

    #[test]
    fn input_while_locked_changes_nothing(
        delays in prop::collection::vec(0usize..40, 1..6),
        other_target in 100u32..200,
    ) {
        let plan = |target: Entity, variant: usize| AttackPlan {
            variant,
            target,
            origin: Vec3::ZERO,
            target_position: Vec3::new(0.0, 0.0, -5.0),
            damage: 10,
            timing: AttackClipMetadata { total_duration: 1.0, contact_time: 0.4 },
            approach_distance: 1.5,
            easing: Easing::OutQuad,
            cooldown: 1.0,
            combo_window: 0.0,
            sequencing: AttackSequencing::Cooldown,
            started_at: 0.0,
        };

        let locked = Entity::from_raw(1);
        let mut session = CombatSession::default();
        session.begin(plan(locked, 0)).expect("idle session");

        for delay in delays {
            for _ in 0..delay {
                session.advance(1.0 / 60.0, SignalSource::Timeline);
            }
            if session.can_attack() {
                break;
            }

            let state = session.state();
            let target = session.locked_target();
            let attack = session.current_attack();

            prop_assert!(session.begin(plan(Entity::from_raw(other_target), 1)).is_err());
            prop_assert_eq!(session.state(), state);
            prop_assert_eq!(session.locked_target(), target);
            prop_assert_eq!(session.current_attack(), attack);
            prop_assert!(matches!(state, CombatState::Attacking | CombatState::Cooldown));
        }
    }
}
