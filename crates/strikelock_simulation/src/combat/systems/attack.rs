//! Attack input → target selection → Idle → Attacking.

use bevy::prelude::*;
use rand::Rng;

use crate::combat::components::{
    AttackPlan, AttackRejection, CombatSession, CombatState, StaggerState,
};
use crate::combat::events::{AnimationCommand, CombatEvent};
use crate::combat::timeline::AttackTimeline;
use crate::components::{CombatLayers, InputChannels, MeleeFighter, MovementAxis};
use crate::config::CombatConfig;
use crate::input::PlayerInputEvent;
use crate::shared::CameraFrame;
use crate::targeting::{
    collect_scene_proxies, DetectorSettings, ProxyRadius, SceneQuery, SceneQueryOverride,
    TargetDetector, TargetQuery, TargetSelection, TransformSceneQuery,
};
use crate::DeterministicRng;

/// Выбор variant'а: combo link из ComboWindow, иначе случайный из [0, count).
///
/// `None` если variants нет вообще.
pub fn choose_variant(
    session: &CombatSession,
    timeline: &AttackTimeline,
    variant_count: usize,
    rng: &mut impl Rng,
) -> Option<usize> {
    if session.state() == CombatState::ComboWindow {
        if let Some(next) = session
            .current_attack()
            .and_then(|current| timeline.next_combo(current))
        {
            return Some(next);
        }
    }

    if variant_count == 0 {
        return None;
    }
    Some(rng.gen_range(0..variant_count))
}

/// Собрать `AttackPlan` для выбранной цели.
///
/// Metadata обязана существовать для variant'а, иначе `MissingClip`
/// и session остаётся нетронутой.
pub fn build_attack_plan(
    timeline: &AttackTimeline,
    config: &CombatConfig,
    variant: usize,
    origin: Vec3,
    selection: &TargetSelection,
    started_at: f32,
) -> Result<AttackPlan, AttackRejection> {
    let (Some(definition), Some(timing)) =
        (timeline.definition(variant), timeline.metadata(variant))
    else {
        return Err(AttackRejection::MissingClip { variant });
    };

    Ok(AttackPlan {
        variant,
        target: selection.entity,
        origin,
        target_position: selection.position,
        damage: definition.damage,
        timing,
        approach_distance: config.approach_distance,
        easing: config.approach_easing,
        cooldown: config.attack_cooldown,
        combo_window: definition.combo_window,
        sequencing: config.sequencing,
        started_at,
    })
}

/// Всё, что нужно для старта атаки, кроме самого fighter'а
pub struct AttackContext<'a> {
    pub config: &'a CombatConfig,
    pub timeline: Option<&'a AttackTimeline>,
    pub detector: &'a TargetDetector,
    pub scene: &'a dyn SceneQuery,
    pub camera: &'a CameraFrame,
    /// Simulation time (секунды)
    pub now: f32,
}

/// Полная проверка attack input и переход Idle → Attacking.
///
/// Порядок проверок: stagger → session state → attack channel → content →
/// target → variant/metadata. При любом отказе session не меняется.
#[allow(clippy::too_many_arguments)]
pub fn try_begin_attack(
    attacker: Entity,
    transform: &Transform,
    session: &mut CombatSession,
    channels: &InputChannels,
    axis: Vec2,
    stagger: Option<&StaggerState>,
    ctx: &AttackContext,
    rng: &mut impl Rng,
) -> Result<(AttackPlan, Vec3), AttackRejection> {
    if stagger.is_some_and(StaggerState::is_staggered) {
        return Err(AttackRejection::Staggered);
    }
    session.accepts_input()?;
    if !channels.attack {
        return Err(AttackRejection::CannotAttack);
    }
    let timeline = ctx
        .timeline
        .filter(|timeline| !timeline.is_empty())
        .ok_or(AttackRejection::NoContent)?;

    let origin = transform.translation;
    let query = TargetQuery {
        origin,
        forward: transform.forward().as_vec3(),
        input_direction: ctx.camera.world_direction(axis),
        exclude: Some(attacker),
    };

    let selection = match ctx.detector.select(ctx.scene, &query) {
        Ok(Some(selection)) => selection,
        Ok(None) => return Err(AttackRejection::NoTarget),
        Err(error) => {
            crate::logger::log_warning(&format!(
                "⚠️ Scene query failed for {:?}: {} (treated as no candidates)",
                attacker, error
            ));
            return Err(AttackRejection::NoTarget);
        }
    };

    let variant_count = ctx.config.attack_variants.unwrap_or(timeline.len());
    let variant =
        choose_variant(session, timeline, variant_count, rng).ok_or(AttackRejection::NoContent)?;

    let plan = build_attack_plan(timeline, ctx.config, variant, origin, &selection, ctx.now)?;
    let destination = session.begin(plan)?;

    Ok((plan, destination))
}

/// System: обработка `AttackPressed`.
///
/// Отказ = `CombatEvent::InputRejected` (defined no-op, не ошибка).
#[allow(clippy::too_many_arguments)]
pub fn process_attack_input(
    mut inputs: EventReader<PlayerInputEvent>,
    mut fighters: Query<
        (
            &Transform,
            &mut CombatSession,
            &mut InputChannels,
            &MovementAxis,
            Option<&StaggerState>,
        ),
        With<MeleeFighter>,
    >,
    proxies: Query<(Entity, &Transform, &CombatLayers, Option<&ProxyRadius>)>,
    scene_override: Option<Res<SceneQueryOverride>>,
    timeline: Option<Res<AttackTimeline>>,
    config: Res<CombatConfig>,
    camera: Res<CameraFrame>,
    time: Res<Time<Fixed>>,
    mut rng: ResMut<DeterministicRng>,
    mut animation: EventWriter<AnimationCommand>,
    mut combat_events: EventWriter<CombatEvent>,
) {
    if inputs.is_empty() {
        return;
    }

    // Snapshot сцены один раз за тик (если host не подставил свой backend)
    let local_scene: TransformSceneQuery;
    let scene: &dyn SceneQuery = match scene_override.as_deref() {
        Some(SceneQueryOverride(backend)) => &**backend,
        None => {
            local_scene = collect_scene_proxies(proxies.iter());
            &local_scene
        }
    };

    let detector = TargetDetector::new(DetectorSettings::from(&*config));
    let ctx = AttackContext {
        config: &config,
        timeline: timeline.as_deref(),
        detector: &detector,
        scene,
        camera: &camera,
        now: time.elapsed_secs(),
    };

    for input in inputs.read() {
        let PlayerInputEvent::AttackPressed { entity: attacker } = *input else {
            continue;
        };

        let Ok((transform, mut session, mut channels, axis, stagger)) = fighters.get_mut(attacker)
        else {
            crate::logger::log(&format!(
                "⚠️ Attack input for non-fighter entity {:?} ignored",
                attacker
            ));
            continue;
        };

        let result = try_begin_attack(
            attacker,
            transform,
            &mut session,
            &channels,
            axis.0,
            stagger,
            &ctx,
            &mut rng.rng,
        );

        match result {
            Ok((plan, destination)) => {
                channels.disable_all();

                animation.write(AnimationCommand::SetVariant {
                    entity: attacker,
                    variant: plan.variant,
                });
                animation.write(AnimationCommand::Trigger {
                    entity: attacker,
                    name: config.attack_trigger.clone(),
                });
                combat_events.write(CombatEvent::AttackStarted {
                    attacker,
                    target: plan.target,
                    variant: plan.variant,
                    destination,
                    contact_time: plan.timing.contact_time,
                    total_duration: plan.timing.total_duration,
                });

                crate::logger::log(&format!(
                    "⚔️ Attack started: {:?} → {:?} (variant {}, contact {:.3}s, total {:.3}s)",
                    attacker,
                    plan.target,
                    plan.variant,
                    plan.timing.contact_time,
                    plan.timing.total_duration
                ));
            }
            Err(reason) => {
                combat_events.write(CombatEvent::InputRejected { attacker, reason });
                crate::logger::log(&format!(
                    "🚫 Attack input rejected for {:?}: {:?}",
                    attacker, reason
                ));
            }
        }
    }
}
