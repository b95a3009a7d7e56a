//! Session tick: approach motion, timeline signals, cooldown/combo decay.

use bevy::prelude::*;

use crate::combat::components::{CombatSession, SessionSignals};
use crate::combat::events::{CombatEvent, ContactReached};
use crate::components::{InputChannels, MeleeFighter};
use crate::config::CombatConfig;

/// System: продвинуть все combat sessions на fixed delta.
///
/// Позиция пишется напрямую в Transform (motion driver), сигналы
/// превращаются в события. Contact только ставится в очередь:
/// урон применяет `resolve_contacts`.
pub fn advance_combat_sessions(
    mut fighters: Query<
        (Entity, &mut Transform, &mut CombatSession, &mut InputChannels),
        With<MeleeFighter>,
    >,
    config: Res<CombatConfig>,
    time: Res<Time<Fixed>>,
    mut contacts: EventWriter<ContactReached>,
    mut combat_events: EventWriter<CombatEvent>,
) {
    let delta = time.delta_secs();

    for (entity, mut transform, mut session, mut channels) in fighters.iter_mut() {
        // Facing берём до advance: на completion он уже сброшен
        let facing = session.facing();

        let signals = session.advance(delta, config.signal_source);
        if signals == SessionSignals::default() {
            continue;
        }

        if let Some(position) = signals.position {
            transform.translation = position;
            if let Some(direction) = facing {
                transform.look_to(direction, Vec3::Y);
            }
        }

        if let Some(order) = signals.contact {
            contacts.write(ContactReached {
                attacker: entity,
                order,
            });
        }

        if signals.completed {
            channels.enable_all();
            combat_events.write(CombatEvent::AttackCompleted { attacker: entity });
            crate::logger::log(&format!(
                "✅ Attack completed: {:?} (state → {:?})",
                entity,
                session.state()
            ));
        }

        if signals.cooldown_elapsed {
            combat_events.write(CombatEvent::CooldownElapsed { attacker: entity });
        }

        if signals.combo_expired {
            combat_events.write(CombatEvent::ComboExpired { attacker: entity });
            crate::logger::log(&format!("⌛ Combo window expired: {:?}", entity));
        }
    }
}
