//! External interruption: stagger, disable, fighter removal.

use bevy::ecs::component::HookContext;
use bevy::ecs::world::DeferredWorld;
use bevy::prelude::*;

use crate::combat::components::{CombatSession, StaggerState};
use crate::combat::events::{AnimationCommand, CombatEvent, CombatInterrupt, InterruptReason};
use crate::components::{InputChannels, MeleeFighter};

/// System: обработка `CombatInterrupt`.
///
/// Motion и target сбрасываются, input channels включаются безусловно
/// (иначе персонаж навсегда останется без управления).
pub fn process_interrupts(
    mut interrupts: EventReader<CombatInterrupt>,
    mut fighters: Query<
        (&mut CombatSession, &mut InputChannels, Option<&mut StaggerState>),
        With<MeleeFighter>,
    >,
    mut commands: Commands,
    mut animation: EventWriter<AnimationCommand>,
    mut combat_events: EventWriter<CombatEvent>,
) {
    for interrupt in interrupts.read() {
        let entity = interrupt.entity;
        let Ok((mut session, mut channels, stagger)) = fighters.get_mut(entity) else {
            crate::logger::log(&format!(
                "Interrupt for non-fighter entity {:?} ignored",
                entity
            ));
            continue;
        };

        let was_attacking = session.cancel();
        channels.enable_all();

        if was_attacking {
            animation.write(AnimationCommand::Cancel { entity });
            combat_events.write(CombatEvent::AttackCancelled { attacker: entity });
        }

        if let InterruptReason::Stagger { duration, source } = interrupt.reason {
            match stagger {
                Some(mut current) => {
                    // Более длинный stagger не укорачивается более коротким
                    current.timer = current.timer.max(duration);
                    current.source = source.or(current.source);
                }
                None => {
                    commands
                        .entity(entity)
                        .insert(StaggerState::new(duration, source));
                }
            }
        }

        crate::logger::log(&format!(
            "🛑 Combat interrupted: {:?} ({:?}, attack cancelled: {}, state → {:?})",
            entity,
            interrupt.reason,
            was_attacking,
            session.state()
        ));
    }
}

/// System: stagger таймеры (по истечении component удаляется)
pub fn tick_stagger_states(
    mut staggered: Query<(Entity, &mut StaggerState)>,
    time: Res<Time<Fixed>>,
    mut commands: Commands,
) {
    let delta = time.delta_secs();

    for (entity, mut stagger) in staggered.iter_mut() {
        stagger.timer -= delta;
        if !stagger.is_staggered() {
            commands.entity(entity).remove::<StaggerState>();
            crate::logger::log(&format!("Stagger ended: {:?}", entity));
        }
    }
}

/// Hook: `MeleeFighter` снимается с entity (remove или despawn).
///
/// Hook срабатывает до удаления компонентов, так что session ещё видна
/// и при despawn. `AnimationCommand::Cancel` уходит только если fighter
/// был посреди атаки.
pub fn on_fighter_removed(mut world: DeferredWorld, ctx: HookContext) {
    let entity = ctx.entity;

    let was_attacking = world
        .get_mut::<CombatSession>(entity)
        .is_some_and(|mut session| session.cancel());
    if let Some(mut channels) = world.get_mut::<InputChannels>(entity) {
        channels.enable_all();
    }

    if was_attacking {
        world.send_event(AnimationCommand::Cancel { entity });
        world.send_event(CombatEvent::AttackCancelled { attacker: entity });
    }

    crate::logger::log(&format!(
        "MeleeFighter removed: {:?} (attack cancelled: {})",
        entity, was_attacking
    ));
}
