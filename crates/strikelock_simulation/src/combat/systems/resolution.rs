//! Contact resolution: animation driver signals + damage application.

use bevy::prelude::*;

use crate::combat::components::CombatSession;
use crate::combat::events::{AnimationSignal, CombatEvent, ContactReached, DamageDealt};
use crate::components::{DamageReceiver, Damageable, InputChannels, MeleeFighter};
use crate::config::{CombatConfig, SignalSource};
use crate::targeting::{ProxyRadius, DEFAULT_PROXY_RADIUS};

/// System: contact/completion от host animation driver.
///
/// Учитывается только при `SignalSource::AnimationDriver`; в timeline
/// режиме session сама отсчитывает время и внешние сигналы игнорируются.
pub fn apply_animation_signals(
    mut signals: EventReader<AnimationSignal>,
    mut fighters: Query<(&mut CombatSession, &mut InputChannels), With<MeleeFighter>>,
    config: Res<CombatConfig>,
    mut contacts: EventWriter<ContactReached>,
    mut combat_events: EventWriter<CombatEvent>,
) {
    if config.signal_source != SignalSource::AnimationDriver {
        for signal in signals.read() {
            crate::logger::log(&format!(
                "Animation signal {:?} ignored (timeline signal source)",
                signal
            ));
        }
        return;
    }

    for signal in signals.read() {
        match *signal {
            AnimationSignal::Contact { entity } => {
                let Ok((mut session, _)) = fighters.get_mut(entity) else {
                    continue;
                };
                // Повторный contact в той же атаке ничего не выдаёт
                if let Some(order) = session.take_contact() {
                    contacts.write(ContactReached {
                        attacker: entity,
                        order,
                    });
                }
            }
            AnimationSignal::AttackComplete { entity } => {
                let Ok((mut session, mut channels)) = fighters.get_mut(entity) else {
                    continue;
                };
                let Some(idle_now) = session.complete() else {
                    continue;
                };

                channels.enable_all();
                combat_events.write(CombatEvent::AttackCompleted { attacker: entity });
                if idle_now {
                    combat_events.write(CombatEvent::CooldownElapsed { attacker: entity });
                }
                crate::logger::log(&format!(
                    "✅ Attack completed by animation driver: {:?} (state → {:?})",
                    entity,
                    session.state()
                ));
            }
        }
    }
}

/// System: применить урон по `ContactReached`.
///
/// Target проверяется на существование: если он исчез между selection и
/// contact, урон пропускается (`CombatEvent::TargetLost`).
pub fn resolve_contacts(
    mut contacts: EventReader<ContactReached>,
    mut targets: Query<(&Transform, &mut Damageable, Option<&ProxyRadius>)>,
    attackers: Query<&Transform, With<MeleeFighter>>,
    mut damage_events: EventWriter<DamageDealt>,
    mut combat_events: EventWriter<CombatEvent>,
) {
    for contact in contacts.read() {
        let attacker = contact.attacker;
        let target = contact.order.target;

        let Ok((target_transform, mut damageable, radius)) = targets.get_mut(target) else {
            crate::logger::log(&format!(
                "Contact skipped: target {:?} of {:?} no longer exists",
                target, attacker
            ));
            combat_events.write(CombatEvent::TargetLost { attacker, target });
            continue;
        };

        // Точка попадания: поверхность прокси-сферы со стороны атакующего
        let target_position = target_transform.translation;
        let radius = radius.map_or(DEFAULT_PROXY_RADIUS, |r| r.0);
        let hit_point = attackers
            .get(attacker)
            .map(|t| (t.translation - target_position).normalize_or_zero())
            .map_or(target_position, |dir| target_position + dir * radius);

        let was_alive = damageable.is_alive();
        damageable.take_damage(contact.order.damage, hit_point);
        let target_died = was_alive && !damageable.is_alive();

        combat_events.write(CombatEvent::Contact { attacker, target });
        damage_events.write(DamageDealt {
            attacker,
            target,
            damage: contact.order.damage,
            hit_point,
            target_died,
        });

        crate::logger::log(&format!(
            "💥 Contact: {:?} → {:?} (damage: {}, HP: {}/{}{})",
            attacker,
            target,
            contact.order.damage,
            damageable.health,
            damageable.max_health,
            if target_died { ", died" } else { "" }
        ));
    }
}

/// System: hit reaction таймеры целей
pub fn tick_hit_reactions(mut targets: Query<&mut Damageable>, time: Res<Time<Fixed>>) {
    let delta = time.delta_secs();
    for mut damageable in targets.iter_mut() {
        if damageable.is_hit() {
            damageable.tick_reaction(delta);
        }
    }
}
