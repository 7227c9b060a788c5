use log::debug;
use macroquad::math::{Rect, Vec2, vec2};
use serde::{Deserialize, Serialize};

use crate::animation::{AnimMeta, Animator};
use crate::collision::{center, hits_any, rect_at, resolve_move};
use crate::config::{ClassConfig, PlayerFrames, SimConfig};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weapon {
    Sword,
    Bow,
    Staff,
}

impl Weapon {
    pub fn name(self) -> &'static str {
        match self {
            Self::Sword => "sword",
            Self::Bow => "bow",
            Self::Staff => "staff",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ability {
    Blink,
    Trap,
    Slam,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerClass {
    Warrior,
    Rogue,
    Wizard,
}

impl PlayerClass {
    pub const ALL: [PlayerClass; 3] = [Self::Warrior, Self::Rogue, Self::Wizard];
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Facing {
    Left,
    Right,
}

impl Facing {
    pub fn sign(self) -> f32 {
        match self {
            Self::Left => -1.0,
            Self::Right => 1.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlinkInProgress {
    pub started_at: f64,
    pub target_x: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PlayerState {
    Sleep,
    Idle,
    Run,
    Attack { started_at: f64 },
    Ability { started_at: f64 },
    Blink(BlinkInProgress),
    Die,
}

impl PlayerState {
    /// Attack, ability and blink lock out movement and other actions.
    pub fn is_acting(&self) -> bool {
        matches!(
            self,
            Self::Attack { .. } | Self::Ability { .. } | Self::Blink(_)
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Sleep => "sleep",
            Self::Idle => "idle",
            Self::Run => "run",
            Self::Attack { .. } => "attack",
            Self::Ability { .. } => "ability",
            Self::Blink(_) => "blink",
            Self::Die => "die",
        }
    }
}

pub struct Player {
    pub pos: Vec2,
    pub size: Vec2,
    pub facing: Facing,
    pub state: PlayerState,
    pub anim: Animator,
    pub weapon: Option<Weapon>,
    pub health: i32,
    pub max_health: i32,
    pub speed: f32,
    pub hurt_at: Option<f64>,
    pub ability: Ability,
    pub ability_cooldown_ms: f64,
    pub ability_used_at: Option<f64>,
    pub dead: bool,
}

impl Player {
    pub fn new(pos: Vec2, config: &SimConfig, class: &ClassConfig) -> Self {
        Self {
            pos,
            size: vec2(config.player.width, config.player.height),
            facing: Facing::Right,
            state: PlayerState::Sleep,
            anim: Animator::default(),
            weapon: None,
            health: class.max_hp,
            max_health: class.max_hp,
            speed: class.speed,
            hurt_at: None,
            ability: class.ability,
            ability_cooldown_ms: class.ability_cooldown_ms,
            ability_used_at: None,
            dead: false,
        }
    }

    pub fn rect(&self) -> Rect {
        rect_at(self.pos, self.size)
    }

    pub fn center(&self) -> Vec2 {
        center(&self.rect())
    }

    pub fn set_state(&mut self, state: PlayerState) {
        if self.state.name() != state.name() {
            debug!("player {} -> {}", self.state.name(), state.name());
        }
        self.state = state;
        self.anim.reset();
    }

    pub fn is_invulnerable(&self, now: f64, invuln_ms: f64) -> bool {
        self.hurt_at.is_some_and(|t| now - t < invuln_ms)
    }

    pub fn ability_ready(&self, now: f64) -> bool {
        self.ability_used_at
            .is_none_or(|t| now - t >= self.ability_cooldown_ms)
    }

    /// Leaves sleep on the first gameplay input. Returns true while still asleep.
    pub fn update_sleep(&mut self, dt: f32, woke: bool, frames: &PlayerFrames) -> bool {
        if self.state != PlayerState::Sleep {
            return false;
        }
        if woke {
            self.set_state(PlayerState::Idle);
            return false;
        }
        self.anim.advance_looping(dt, &frames.sleep);
        true
    }

    /// Dying, blinking and using an ability ignore movement and turning.
    pub fn is_locked(&self) -> bool {
        matches!(
            self.state,
            PlayerState::Die | PlayerState::Blink(_) | PlayerState::Ability { .. }
        )
    }

    pub fn face(&mut self, dx: f32) {
        if dx < 0.0 {
            self.facing = Facing::Left;
        } else if dx > 0.0 {
            self.facing = Facing::Right;
        }
    }

    /// Applies movement intent. Facing follows horizontal input even when
    /// the player is rooted by an attack.
    pub fn apply_movement(&mut self, intent: Vec2, dt: f32, solids: &[Rect]) {
        if self.is_locked() {
            return;
        }
        self.face(intent.x);
        if matches!(self.state, PlayerState::Attack { .. }) {
            return;
        }

        if intent.length_squared() > 0.0 {
            let step = intent.normalize() * self.speed * dt;
            self.pos = resolve_move(self.rect(), step.x, step.y, solids);
            if self.state != PlayerState::Run {
                self.set_state(PlayerState::Run);
            }
        } else if self.state != PlayerState::Idle {
            self.set_state(PlayerState::Idle);
        }
    }

    pub fn can_attack(&self) -> bool {
        self.weapon.is_some() && !self.state.is_acting() && self.state != PlayerState::Die && !self.dead
    }

    pub fn can_use_ability(&self, now: f64) -> bool {
        self.ability_ready(now) && !self.state.is_acting() && self.state != PlayerState::Die && !self.dead
    }

    /// Steps forward in `step` increments up to `max_dist`, stopping at the
    /// last position that does not overlap a solid.
    pub fn blink_target(&self, step: f32, max_dist: f32, solids: &[Rect]) -> f32 {
        let dir = self.facing.sign();
        let mut target_x = self.pos.x;
        let mut traveled = 0.0;
        while traveled < max_dist {
            let next = target_x + dir * step;
            if hits_any(&rect_at(vec2(next, self.pos.y), self.size), solids) {
                break;
            }
            target_x = next;
            traveled += step;
        }
        target_x
    }

    /// Frame-rate animation for looping states and the death animation.
    /// Returns true on the tick the death animation finishes.
    pub fn animate(&mut self, dt: f32, frames: &PlayerFrames) -> bool {
        let meta = anim_meta(&self.state, frames);
        match self.state {
            PlayerState::Die => {
                if self.dead {
                    return false;
                }
                if self.anim.advance_once(dt, &meta) {
                    self.dead = true;
                    return true;
                }
                false
            }
            PlayerState::Attack { .. } | PlayerState::Ability { .. } | PlayerState::Blink(_) => {
                self.anim.tick(dt, &meta);
                false
            }
            _ => {
                self.anim.advance_looping(dt, &meta);
                false
            }
        }
    }

    /// Drives attack, ability and blink by elapsed time, returning to idle
    /// when they finish. A blink moves the player only at that point.
    pub fn update_timed_action(&mut self, now: f64, frames: &PlayerFrames) {
        let (started_at, meta) = match self.state {
            PlayerState::Attack { started_at } | PlayerState::Ability { started_at } => {
                (started_at, frames.attack)
            }
            PlayerState::Blink(blink) => (blink.started_at, frames.blink),
            _ => return,
        };

        let elapsed = now - started_at;
        self.anim.frame = meta.frame_at(elapsed);
        if elapsed < meta.duration_ms() {
            return;
        }

        if let PlayerState::Blink(blink) = self.state {
            self.pos.x = blink.target_x;
        }
        if self.health <= 0 {
            self.set_state(PlayerState::Die);
        } else {
            self.set_state(PlayerState::Idle);
        }
    }

    /// Returns true if the hit landed.
    pub fn take_damage(&mut self, amount: i32, now: f64) -> bool {
        if amount <= 0 || self.state == PlayerState::Die || self.dead {
            return false;
        }
        self.health = (self.health - amount).clamp(0, self.max_health);
        self.hurt_at = Some(now);
        if self.health == 0 && !self.state.is_acting() {
            self.set_state(PlayerState::Die);
        }
        true
    }

    /// Returns true if any health was restored.
    pub fn heal(&mut self, amount: i32) -> bool {
        if amount <= 0 || self.health <= 0 || self.health >= self.max_health || self.state == PlayerState::Die {
            return false;
        }
        self.health = (self.health + amount).min(self.max_health);
        true
    }
}

pub fn anim_meta(state: &PlayerState, frames: &PlayerFrames) -> AnimMeta {
    match state {
        PlayerState::Sleep => frames.sleep,
        PlayerState::Die => frames.die,
        PlayerState::Blink(_) => frames.blink,
        PlayerState::Attack { .. } | PlayerState::Ability { .. } => frames.attack,
        PlayerState::Run => frames.run,
        PlayerState::Idle => frames.idle,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;

    fn player() -> Player {
        let cfg = SimConfig::default();
        Player::new(vec2(64.0, 64.0), &cfg, &cfg.classes.wizard)
    }

    #[test]
    fn damage_while_acting_defers_death() {
        let frames = PlayerFrames::default();
        let mut p = player();
        p.health = 1;
        p.set_state(PlayerState::Attack { started_at: 0.0 });
        assert!(p.take_damage(1, 10.0));
        assert!(matches!(p.state, PlayerState::Attack { .. }));
        p.update_timed_action(frames.attack.duration_ms() + 1.0, &frames);
        assert_eq!(p.state, PlayerState::Die);
    }

    #[test]
    fn heal_is_capped() {
        let mut p = player();
        p.health = p.max_health - 1;
        assert!(p.heal(5));
        assert_eq!(p.health, p.max_health);
        assert!(!p.heal(1));
    }
}
