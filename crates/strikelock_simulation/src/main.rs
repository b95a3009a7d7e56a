//! Headless симуляция STRIKELOCK
//!
//! Игрок атакует двух врагов: выбор цели, approach, contact, cooldown.
//! Animation driver здесь нет, signals идут от timeline.

use bevy::prelude::*;
use strikelock_simulation::combat::TimelineSettings;
use strikelock_simulation::*;

const ATTACK_CONTENT: &str = r#"(
    clips: [
        (name: "slash_a", length: 1.0, markers: [(name: "OnContact", time: 0.4)]),
        (name: "slash_b", length: 0.9, markers: [(name: "OnContact", time: 0.35)]),
    ],
    attacks: [
        (name: "slash_left", clip: "slash_a", damage: 25),
        (name: "slash_right", clip: "slash_b", damage: 20),
    ],
)"#;

fn main() {
    let seed = 42;
    println!("Starting STRIKELOCK headless simulation (seed: {})", seed);

    let mut app = create_headless_app(seed);
    app.add_plugins(SimulationPlugin);

    let settings = TimelineSettings::from(app.world().resource::<CombatConfig>());
    match AttackTimeline::from_ron(ATTACK_CONTENT, &settings) {
        Ok(timeline) => {
            app.insert_resource(timeline);
        }
        Err(error) => {
            logger::log_error(&format!("❌ Attack content rejected: {}", error));
            return;
        }
    }

    let player = app
        .world_mut()
        .spawn((MeleeFighter, MovementAxis(Vec2::Y), Transform::default()))
        .id();
    let near = app
        .world_mut()
        .spawn((Damageable::new(100), Transform::from_xyz(0.5, 0.0, -4.0)))
        .id();
    let far = app
        .world_mut()
        .spawn((Damageable::new(100), Transform::from_xyz(-3.0, 0.0, -3.0)))
        .id();

    // 5 секунд, атака раз в секунду
    for tick in 0..300 {
        if tick % 60 == 0 {
            app.world_mut()
                .send_event(PlayerInputEvent::AttackPressed { entity: player });
        }
        step_fixed_ticks(&mut app, 1);

        if tick % 60 == 59 {
            let world = app.world();
            let session = world.get::<CombatSession>(player);
            let position = world.get::<Transform>(player).map(|t| t.translation);
            let health = |entity| world.get::<Damageable>(entity).map(|d| d.health);
            println!(
                "Tick {}: state {:?}, player at {:?}, HP near {:?} / far {:?}",
                tick,
                session.map(|s| s.state()),
                position,
                health(near),
                health(far)
            );
        }
    }

    println!("Simulation complete!");
}
