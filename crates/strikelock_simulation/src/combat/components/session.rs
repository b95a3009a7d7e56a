//! Combat session: attack state machine одного персонажа.
//!
//! # States
//!
//! ```text
//! Cooldown sequencing:  Idle → Attacking → Cooldown → Idle
//! Combo sequencing:     Idle → Attacking → ComboWindow → Idle
//!                                          (follow-up input → Attacking)
//! ```
//!
//! Все таймеры: resumable state, двигается через `advance(dt)`, который
//! возвращает сработавшие за тик сигналы (`SessionSignals`) вместо callback'ов.

use bevy::prelude::*;

use crate::combat::motion::{approach_destination, ApproachMotion, Easing, TIME_EPSILON};
use crate::combat::timeline::AttackClipMetadata;
use crate::config::{AttackSequencing, SignalSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
pub enum CombatState {
    #[default]
    Idle,
    Attacking,
    ComboWindow,
    Cooldown,
}

/// Почему attack input был отброшен (defined no-op, не ошибка)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttackRejection {
    /// can_attack == false (cooldown) или attack channel выключен
    CannotAttack,
    /// Атака уже идёт
    Busy,
    /// Персонаж в stagger
    Staggered,
    /// Нет цели (нулевой input или никого рядом)
    NoTarget,
    /// Для выбранного variant нет клипа/metadata
    MissingClip { variant: usize },
    /// Attack timeline не загружен
    NoContent,
}

/// Всё, что нужно session для старта атаки (собирается системой)
#[derive(Debug, Clone, Copy)]
pub struct AttackPlan {
    pub variant: usize,
    pub target: Entity,
    pub origin: Vec3,
    pub target_position: Vec3,
    pub damage: u32,
    pub timing: AttackClipMetadata,
    pub approach_distance: f32,
    pub easing: Easing,
    pub cooldown: f32,
    pub combo_window: f32,
    pub sequencing: AttackSequencing,
    /// Simulation time старта (секунды)
    pub started_at: f32,
}

/// Приказ нанести урон locked target (выдаётся не больше одного раза за атаку)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContactOrder {
    pub target: Entity,
    pub damage: u32,
    pub variant: usize,
}

/// Сигналы, сработавшие за один `advance`
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SessionSignals {
    /// Новая позиция от approach motion
    pub position: Option<Vec3>,
    pub contact: Option<ContactOrder>,
    pub completed: bool,
    pub cooldown_elapsed: bool,
    pub combo_expired: bool,
}

/// Attack lifecycle персонажа (один на fighter'а)
///
/// Инварианты:
/// - `locked_target` is `Some` только в `Attacking`
/// - в cooldown sequencing `can_attack == false` на всём интервале
///   [старт атаки, completion + cooldown]
#[derive(Component, Debug, Clone)]
pub struct CombatSession {
    state: CombatState,
    can_attack: bool,
    current_attack: Option<usize>,
    locked_target: Option<Entity>,
    target_hit: bool,
    contact_reached: bool,
    damage: u32,
    timing: Option<AttackClipMetadata>,
    motion: Option<ApproachMotion>,
    /// Ground-plane направление на цель, зафиксированное при старте
    facing: Option<Vec3>,
    attack_elapsed: f32,
    started_at: f32,
    sequencing: AttackSequencing,
    cooldown_duration: f32,
    cooldown_remaining: f32,
    combo_window: f32,
    combo_timer: f32,
}

impl Default for CombatSession {
    fn default() -> Self {
        Self {
            state: CombatState::Idle,
            can_attack: true,
            current_attack: None,
            locked_target: None,
            target_hit: false,
            contact_reached: false,
            damage: 0,
            timing: None,
            motion: None,
            facing: None,
            attack_elapsed: 0.0,
            started_at: 0.0,
            sequencing: AttackSequencing::Cooldown,
            cooldown_duration: 0.0,
            cooldown_remaining: 0.0,
            combo_window: 0.0,
            combo_timer: 0.0,
        }
    }
}

impl CombatSession {
    pub fn state(&self) -> CombatState {
        self.state
    }

    pub fn can_attack(&self) -> bool {
        self.can_attack
    }

    pub fn is_attacking(&self) -> bool {
        self.state == CombatState::Attacking
    }

    pub fn current_attack(&self) -> Option<usize> {
        self.current_attack
    }

    pub fn locked_target(&self) -> Option<Entity> {
        self.locked_target
    }

    pub fn target_hit(&self) -> bool {
        self.target_hit
    }

    pub fn timing(&self) -> Option<AttackClipMetadata> {
        self.timing
    }

    pub fn motion(&self) -> Option<&ApproachMotion> {
        self.motion.as_ref()
    }

    pub fn facing(&self) -> Option<Vec3> {
        self.facing
    }

    pub fn attack_elapsed(&self) -> f32 {
        self.attack_elapsed
    }

    pub fn started_at(&self) -> f32 {
        self.started_at
    }

    pub fn cooldown_remaining(&self) -> f32 {
        self.cooldown_remaining
    }

    pub fn combo_timer(&self) -> f32 {
        self.combo_timer
    }

    /// Примет ли session attack input прямо сейчас
    pub fn accepts_input(&self) -> Result<(), AttackRejection> {
        match self.state {
            CombatState::Idle if self.can_attack => Ok(()),
            CombatState::ComboWindow if self.can_attack => Ok(()),
            CombatState::Attacking => Err(AttackRejection::Busy),
            _ => Err(AttackRejection::CannotAttack),
        }
    }

    /// Idle/ComboWindow → Attacking.
    ///
    /// Approach motion стартует сразу и длится ровно `contact_time`:
    /// позиция и animation contact совпадают по построению.
    /// Возвращает точку, куда придёт персонаж.
    pub fn begin(&mut self, plan: AttackPlan) -> Result<Vec3, AttackRejection> {
        self.accepts_input()?;

        let destination =
            approach_destination(plan.origin, plan.target_position, plan.approach_distance);

        self.state = CombatState::Attacking;
        self.can_attack = false;
        self.current_attack = Some(plan.variant);
        self.locked_target = Some(plan.target);
        self.target_hit = false;
        self.contact_reached = false;
        self.damage = plan.damage;
        self.timing = Some(plan.timing);
        self.motion = Some(ApproachMotion::new(
            plan.origin,
            destination,
            plan.timing.contact_time,
            plan.easing,
        ));
        self.facing = Some(crate::shared::flatten(plan.target_position - plan.origin))
            .filter(|direction| *direction != Vec3::ZERO);
        self.attack_elapsed = 0.0;
        self.started_at = plan.started_at;
        self.sequencing = plan.sequencing;
        self.cooldown_duration = plan.cooldown;
        self.cooldown_remaining = 0.0;
        self.combo_window = plan.combo_window;
        self.combo_timer = 0.0;

        Ok(destination)
    }

    /// Продвинуть все таймеры на `delta` секунд
    pub fn advance(&mut self, delta: f32, source: SignalSource) -> SessionSignals {
        let mut signals = SessionSignals::default();

        match self.state {
            CombatState::Idle => {}
            CombatState::Attacking => {
                self.attack_elapsed += delta;

                if let Some(motion) = self.motion.as_mut() {
                    signals.position = Some(motion.advance(delta));
                }

                if source != SignalSource::Timeline {
                    return signals;
                }

                let Some(timing) = self.timing else {
                    return signals;
                };

                if !self.contact_reached && self.attack_elapsed + TIME_EPSILON >= timing.contact_time
                {
                    signals.contact = self.take_contact();
                }

                if self.attack_elapsed + TIME_EPSILON >= timing.total_duration {
                    signals.completed = true;
                    if self.finish_attack() {
                        signals.cooldown_elapsed = true;
                    }
                }
            }
            CombatState::Cooldown => {
                self.cooldown_remaining -= delta;
                if self.cooldown_remaining <= TIME_EPSILON {
                    self.enter_idle();
                    signals.cooldown_elapsed = true;
                }
            }
            CombatState::ComboWindow => {
                self.combo_timer -= delta;
                if self.combo_timer <= TIME_EPSILON {
                    self.enter_idle();
                    signals.combo_expired = true;
                }
            }
        }

        signals
    }

    /// Contact signal (timeline или animation driver).
    ///
    /// Выдаёт `ContactOrder` только первый раз за атаку: повторный contact
    /// не наносит урон дважды.
    pub fn take_contact(&mut self) -> Option<ContactOrder> {
        if self.state != CombatState::Attacking {
            return None;
        }
        self.contact_reached = true;

        if self.target_hit {
            return None;
        }
        let target = self.locked_target?;
        self.target_hit = true;

        Some(ContactOrder {
            target,
            damage: self.damage,
            variant: self.current_attack.unwrap_or_default(),
        })
    }

    /// Completion signal от animation driver.
    ///
    /// Возвращает `Some(idle_now)` если атака действительно завершилась.
    pub fn complete(&mut self) -> Option<bool> {
        if self.state != CombatState::Attacking {
            return None;
        }
        Some(self.finish_attack())
    }

    /// Прервать атаку (stagger, отключение персонажа).
    ///
    /// Motion и target сбрасываются; из `Attacking` уходим в cooldown,
    /// из `ComboWindow`: сразу в `Idle`. Возвращает true, если атака шла.
    pub fn cancel(&mut self) -> bool {
        let was_attacking = self.state == CombatState::Attacking;

        self.locked_target = None;
        self.motion = None;
        self.facing = None;
        self.target_hit = false;
        self.contact_reached = false;

        match self.state {
            CombatState::Attacking => self.enter_cooldown(),
            CombatState::ComboWindow => self.enter_idle(),
            CombatState::Idle | CombatState::Cooldown => {}
        }

        was_attacking
    }

    /// Attacking → Cooldown / ComboWindow. true если сразу Idle (нулевой таймер)
    fn finish_attack(&mut self) -> bool {
        self.locked_target = None;
        self.motion = None;
        self.facing = None;

        match self.sequencing {
            AttackSequencing::Cooldown => self.enter_cooldown(),
            AttackSequencing::Combo => {
                if self.combo_window <= TIME_EPSILON {
                    self.enter_idle();
                } else {
                    self.state = CombatState::ComboWindow;
                    self.combo_timer = self.combo_window;
                    self.can_attack = true;
                }
            }
        }

        self.state == CombatState::Idle
    }

    fn enter_cooldown(&mut self) {
        if self.cooldown_duration <= TIME_EPSILON {
            self.enter_idle();
            return;
        }
        self.state = CombatState::Cooldown;
        self.cooldown_remaining = self.cooldown_duration;
        self.can_attack = false;
    }

    fn enter_idle(&mut self) {
        self.state = CombatState::Idle;
        self.can_attack = true;
        self.cooldown_remaining = 0.0;
        self.combo_timer = 0.0;
        self.locked_target = None;
    }
}
