use log::debug;
use macroquad::math::{Rect, Vec2, vec2};

use crate::animation::{AnimMeta, Animator};
use crate::collision::{center, rect_at, resolve_move};
use crate::config::{EnemyTuning, GoblinFrames};
use crate::map::TileMap;
use crate::nav::{PathCache, has_line_of_sight};
use crate::player::Facing;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EnemyState {
    Idle,
    Run,
    Attack { started_at: f64 },
    Die,
}

impl EnemyState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Run => "run",
            Self::Attack { .. } => "attack",
            Self::Die => "die",
        }
    }
}

/// Constant-velocity push that overrides the AI until `until`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Knockback {
    pub velocity: Vec2,
    pub until: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DotKind {
    Arrow,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DamageOverTime {
    pub kind: DotKind,
    pub damage: i32,
    pub ticks_left: u32,
    pub next_tick_at: f64,
    pub interval_ms: f64,
}

#[derive(Clone, Debug, Default)]
pub struct AiMemory {
    pub has_seen_player: bool,
    pub path: PathCache,
}

/// What a goblin can see of the world during its update.
pub struct EnemyContext<'a> {
    pub player: Rect,
    pub map: &'a TileMap,
    pub solids: &'a [Rect],
    pub now: f64,
    pub dt: f32,
}

pub struct Enemy {
    pub pos: Vec2,
    pub size: Vec2,
    pub facing: Facing,
    pub state: EnemyState,
    pub anim: Animator,
    pub health: i32,
    pub hurt_at: Option<f64>,
    pub knockback: Option<Knockback>,
    pub stunned_until: f64,
    pub dot: Option<DamageOverTime>,
    pub ai: AiMemory,
    pub dead: bool,
}

impl Enemy {
    pub fn new(pos: Vec2, tuning: &EnemyTuning) -> Self {
        Self {
            pos,
            size: vec2(tuning.width, tuning.height),
            facing: Facing::Right,
            state: EnemyState::Idle,
            anim: Animator::default(),
            health: tuning.max_health,
            hurt_at: None,
            knockback: None,
            stunned_until: 0.0,
            dot: None,
            ai: AiMemory::default(),
            dead: false,
        }
    }

    pub fn rect(&self) -> Rect {
        rect_at(self.pos, self.size)
    }

    pub fn center(&self) -> Vec2 {
        center(&self.rect())
    }

    /// The part of the body that weapons and traps connect with.
    pub fn hurtbox(&self) -> Rect {
        Rect::new(
            self.pos.x + 4.0,
            self.pos.y + 6.0,
            self.size.x - 8.0,
            self.size.y - 10.0,
        )
    }

    /// 12x12 box in front of the goblin, vertically centred on the body.
    pub fn attack_hitbox(&self) -> Rect {
        let (w, h) = (12.0, 12.0);
        let x = match self.facing {
            Facing::Right => self.pos.x + self.size.x - 6.0,
            Facing::Left => self.pos.x - w + 6.0,
        };
        let y = self.pos.y + self.size.y / 2.0 - h / 2.0;
        Rect::new(x, y, w, h)
    }

    /// Alive and not yet dying.
    pub fn is_active(&self) -> bool {
        !self.dead && self.state != EnemyState::Die
    }

    pub fn is_stunned(&self, now: f64) -> bool {
        now < self.stunned_until
    }

    /// Extends the stun; never shortens one already running.
    pub fn stun(&mut self, until: f64) {
        self.stunned_until = self.stunned_until.max(until);
    }

    pub fn set_state(&mut self, state: EnemyState) {
        if self.state == state {
            return;
        }
        debug!("goblin {} -> {}", self.state.name(), state.name());
        self.state = state;
        self.anim.reset();
    }

    /// Ends an attack that has run for `attack_ms`.
    pub fn finish_attack(&mut self, now: f64, attack_ms: f64) {
        if let EnemyState::Attack { started_at } = self.state {
            if now - started_at > attack_ms {
                self.set_state(EnemyState::Idle);
            }
        }
    }

    /// One tick of movement and decision making. Knockback wins over stun,
    /// stun wins over the AI.
    pub fn update_ai(&mut self, ctx: &EnemyContext, tuning: &EnemyTuning) {
        if !self.is_active() {
            return;
        }

        if let Some(kb) = self.knockback {
            if ctx.now < kb.until {
                let step = kb.velocity * ctx.dt;
                self.pos = resolve_move(self.rect(), step.x, step.y, ctx.solids);
                return;
            }
            self.knockback = None;
        }

        if self.is_stunned(ctx.now) {
            return;
        }

        if !self.ai.has_seen_player {
            if !has_line_of_sight(&self.rect(), &ctx.player, ctx.map) {
                return;
            }
            debug!("goblin at ({:.0}, {:.0}) spotted the player", self.pos.x, self.pos.y);
            self.ai.has_seen_player = true;
        }

        let dx = ctx.player.x - self.pos.x;
        let dy = ctx.player.y - self.pos.y;
        self.facing = if dx >= 0.0 { Facing::Right } else { Facing::Left };

        if dx.hypot(dy) > tuning.attack_range {
            if !matches!(self.state, EnemyState::Attack { .. }) {
                self.set_state(EnemyState::Run);
                self.chase(ctx, tuning);
            }
        } else if !matches!(self.state, EnemyState::Attack { .. }) {
            self.set_state(EnemyState::Attack { started_at: ctx.now });
        }
    }

    fn chase(&mut self, ctx: &EnemyContext, tuning: &EnemyTuning) {
        let map = ctx.map;
        let here = self.center();
        let start = map.cell_at(here);
        let target = map.cell_at(center(&ctx.player));

        if self
            .ai
            .path
            .needs_recompute(ctx.now, target, tuning.path_recompute_ms)
        {
            self.ai.path.recompute(start, target, map, ctx.now);
        }

        let step = tuning.speed * ctx.dt;
        let reach = tuning.waypoint_tolerance.max(step);
        let goal = loop {
            match self.ai.path.next_waypoint() {
                Some(cell) => {
                    let waypoint = map.cell_center(cell);
                    if here.distance(waypoint) <= reach {
                        self.ai.path.pop_waypoint();
                        continue;
                    }
                    break waypoint;
                }
                None => break center(&ctx.player),
            }
        };

        let dir = goal - here;
        if dir.length_squared() > 0.0001 {
            let delta = dir.normalize() * step;
            self.pos = resolve_move(self.rect(), delta.x, delta.y, ctx.solids);
        }
    }

    /// Returns true on the tick the death animation finishes.
    pub fn animate(&mut self, dt: f32, frames: &GoblinFrames) -> bool {
        if self.dead {
            return false;
        }
        let meta = anim_meta(&self.state, frames);
        if self.state == EnemyState::Die {
            if self.anim.advance_once(dt, &meta) {
                self.dead = true;
                return true;
            }
            return false;
        }
        self.anim.advance_looping(dt, &meta);
        false
    }
}

pub fn anim_meta(state: &EnemyState, frames: &GoblinFrames) -> AnimMeta {
    match state {
        EnemyState::Idle => frames.idle,
        EnemyState::Run => frames.run,
        EnemyState::Attack { .. } => frames.attack,
        EnemyState::Die => frames.die,
    }
}
