use serde::{Deserialize, Serialize};

use crate::enemy::EnemyState;
use crate::player::{Ability, PlayerState, Weapon};

/// Frame count and playback rate of one sprite-sheet row.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnimMeta {
    pub cols: u32,
    pub fps: f32,
}

impl AnimMeta {
    pub const fn new(cols: u32, fps: f32) -> Self {
        Self { cols, fps }
    }

    pub fn frame_secs(&self) -> f32 {
        1.0 / self.fps.max(0.001)
    }

    pub fn duration_ms(&self) -> f64 {
        self.cols as f64 / self.fps.max(0.001) as f64 * 1000.0
    }

    /// Frame index for a time-driven animation, held on the last frame.
    pub fn frame_at(&self, elapsed_ms: f64) -> u32 {
        let frame = (elapsed_ms.max(0.0) / 1000.0 * self.fps as f64).floor() as u32;
        frame.min(self.cols.saturating_sub(1))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Animator {
    pub frame: u32,
    pub acc: f32,
}

impl Animator {
    pub fn reset(&mut self) {
        self.frame = 0;
        self.acc = 0.0;
    }

    /// Accumulates `dt` and reports whether a frame boundary was crossed.
    /// The caller decides how the frame index moves.
    pub fn tick(&mut self, dt: f32, meta: &AnimMeta) -> bool {
        self.acc += dt;
        if self.acc >= meta.frame_secs() {
            self.acc = 0.0;
            true
        } else {
            false
        }
    }

    pub fn advance_looping(&mut self, dt: f32, meta: &AnimMeta) {
        if self.tick(dt, meta) {
            self.frame = (self.frame + 1) % meta.cols.max(1);
        }
    }

    /// Advances a one-shot animation. Returns true once the last frame has
    /// been shown for a full frame time.
    pub fn advance_once(&mut self, dt: f32, meta: &AnimMeta) -> bool {
        if !self.tick(dt, meta) {
            return false;
        }
        if self.frame + 1 < meta.cols {
            self.frame += 1;
            false
        } else {
            true
        }
    }
}

const ROW_IDLE: u32 = 0;
const ROW_RUN: u32 = 1;
const ROW_DIE: u32 = 3;
const ROW_SLEEP: u32 = 36;
const ROW_BLINK: u32 = 47;
const ROW_SLAM: u32 = 115;

struct WeaponRows {
    idle: u32,
    run: u32,
    attack: u32,
}

fn weapon_rows(weapon: Weapon) -> WeaponRows {
    match weapon {
        Weapon::Sword => WeaponRows {
            idle: 91,
            run: 97,
            attack: 112,
        },
        Weapon::Bow => WeaponRows {
            idle: 95,
            run: 101,
            attack: 104,
        },
        Weapon::Staff => WeaponRows {
            idle: 93,
            run: 99,
            attack: 113,
        },
    }
}

/// Row of the player sprite sheet for the given state, weapon and ability.
pub fn player_sprite_row(state: &PlayerState, weapon: Option<Weapon>, ability: Ability) -> u32 {
    let rows = weapon.map(weapon_rows);
    match state {
        PlayerState::Sleep => ROW_SLEEP,
        PlayerState::Die => ROW_DIE,
        PlayerState::Blink(_) => ROW_BLINK,
        PlayerState::Ability { .. } if ability == Ability::Slam => ROW_SLAM,
        PlayerState::Ability { .. } | PlayerState::Attack { .. } => {
            rows.map(|r| r.attack).unwrap_or(ROW_RUN)
        }
        PlayerState::Run => rows.map(|r| r.run).unwrap_or(ROW_RUN),
        PlayerState::Idle => rows.map(|r| r.idle).unwrap_or(ROW_IDLE),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GoblinSheet {
    Idle,
    Run,
    Attack,
    Die,
}

impl GoblinSheet {
    pub fn file_stem(self) -> &'static str {
        match self {
            Self::Idle => "goblin-idle",
            Self::Run => "goblin-run",
            Self::Attack => "goblin-attack",
            Self::Die => "goblin-die",
        }
    }
}

pub fn goblin_sheet(state: &EnemyState) -> GoblinSheet {
    match state {
        EnemyState::Idle => GoblinSheet::Idle,
        EnemyState::Run => GoblinSheet::Run,
        EnemyState::Attack { .. } => GoblinSheet::Attack,
        EnemyState::Die => GoblinSheet::Die,
    }
}
