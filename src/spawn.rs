use log::{debug, info};
use macroquad::math::{Rect, Vec2};
use rand::Rng;
use rand::seq::SliceRandom;

use crate::collision::{hits_any, overlaps};
use crate::config::{SimConfig, SpawnTuning};
use crate::enemy::Enemy;
use crate::map::{TileMap, WeaponTile};
use crate::player::{Player, PlayerState, Weapon};

/// A weapon lying on the map. `picked` stays set for the rest of the run.
#[derive(Clone, Debug, PartialEq)]
pub struct WeaponPickup {
    pub key: String,
    pub kind: Weapon,
    pub rect: Rect,
    pub picked: bool,
}

impl WeaponPickup {
    /// Half a tile square, centred in its cell.
    pub fn from_tile(tile: &WeaponTile, map: &TileMap, picked: bool) -> Self {
        let size = map.tile_size();
        let origin = map.cell_origin(tile.cell);
        Self {
            key: tile.key.clone(),
            kind: tile.kind,
            rect: Rect::new(origin.x + size / 4.0, origin.y + size / 4.0, size / 2.0, size / 2.0),
            picked,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Heart {
    pub rect: Rect,
    pub created_at: f64,
}

/// Timers for goblin and heart spawns. Both are polled every tick; an
/// attempt that cannot go ahead leaves its timer due so it retries on the
/// next tick.
#[derive(Clone, Debug)]
pub struct Spawner {
    pub next_enemy_at: f64,
    pub next_heart_at: f64,
}

impl Spawner {
    pub fn new(now: f64, tuning: &SpawnTuning) -> Self {
        Self {
            next_enemy_at: now + tuning.enemy_interval_ms,
            next_heart_at: now + tuning.heart_interval_ms,
        }
    }

    /// Adds a goblin at a random spawn point when one is due and the cap
    /// (dying goblins included) allows it.
    pub fn try_spawn_enemy(
        &mut self,
        now: f64,
        enemies: &mut Vec<Enemy>,
        spawn_points: &[Vec2],
        player_armed: bool,
        config: &SimConfig,
        rng: &mut impl Rng,
    ) -> bool {
        let tuning = &config.spawn;
        if now < self.next_enemy_at || enemies.len() >= tuning.max_enemies {
            return false;
        }
        if tuning.require_weapon_to_spawn && !player_armed {
            return false;
        }
        let Some(&point) = spawn_points.choose(rng) else {
            return false;
        };
        enemies.push(Enemy::new(point, &config.enemy));
        self.next_enemy_at = now + tuning.enemy_interval_ms;
        debug!("goblin spawned at ({:.0}, {:.0}), {} alive", point.x, point.y, enemies.len());
        true
    }

    /// Drops a heart on a random walkable cell. Cells whose heart would touch
    /// a wall or an unpicked weapon are rejected until a later tick.
    pub fn try_spawn_heart(
        &mut self,
        now: f64,
        hearts: &mut Vec<Heart>,
        map: &TileMap,
        weapons: &[WeaponPickup],
        tuning: &SpawnTuning,
        rng: &mut impl Rng,
    ) -> bool {
        if now < self.next_heart_at || hearts.len() >= tuning.max_hearts {
            return false;
        }
        let Some(&cell) = map.walkable_cells().choose(rng) else {
            return false;
        };

        let size = tuning.heart_size;
        let origin = map.cell_origin(cell);
        let inset = ((map.tile_size() - size) / 2.0).round();
        let rect = Rect::new(origin.x + inset, origin.y + inset, size, size);
        if hits_any(&rect, map.collision_blocks())
            || weapons.iter().any(|w| !w.picked && overlaps(&rect, &w.rect))
        {
            return false;
        }

        hearts.push(Heart {
            rect,
            created_at: now,
        });
        let jitter = if tuning.heart_jitter_ms > 0.0 {
            rng.gen_range(0.0..tuning.heart_jitter_ms).floor()
        } else {
            0.0
        };
        self.next_heart_at = now + tuning.heart_interval_ms + jitter;
        true
    }
}

/// Despawns stale hearts and lets the player eat the ones they touch.
/// A heart is only consumed when it actually heals.
pub fn update_hearts(hearts: &mut Vec<Heart>, player: &mut Player, now: f64, tuning: &SpawnTuning) {
    hearts.retain(|heart| {
        if now - heart.created_at >= tuning.heart_lifetime_ms {
            return false;
        }
        if overlaps(&player.rect(), &heart.rect) && player.heal(tuning.heart_heal) {
            debug!("heart eaten, {} hp", player.health);
            return false;
        }
        true
    });
}

/// Equips every unpicked weapon the player touches. Returns the keys picked
/// up this tick so they can be recorded in the run state.
pub fn pickup_weapons(weapons: &mut [WeaponPickup], player: &mut Player) -> Vec<String> {
    let mut picked = Vec::new();
    if player.dead || player.state == PlayerState::Die {
        return picked;
    }
    for weapon in weapons.iter_mut().filter(|w| !w.picked) {
        if !overlaps(&player.rect(), &weapon.rect) {
            continue;
        }
        weapon.picked = true;
        player.weapon = Some(weapon.kind);
        if !player.state.is_acting() {
            player.set_state(PlayerState::Idle);
        }
        info!("picked up {}", weapon.kind.name());
        picked.push(weapon.key.clone());
    }
    picked
}
