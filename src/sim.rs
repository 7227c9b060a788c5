use log::info;
use macroquad::math::Vec2;
use rand::Rng;
use std::rc::Rc;

use crate::combat::{
    Explosion, HitContext, Projectile, Trap, advance_projectiles, resolve_enemy_attacks,
    resolve_melee, separate_enemies, slam, tick_damage_over_time, update_traps,
};
use crate::config::SimConfig;
use crate::enemy::{Enemy, EnemyContext};
use crate::input::{Action, ActionSet};
use crate::map::{GameMap, GridIndex};
use crate::player::{Ability, BlinkInProgress, Player, PlayerState};
use crate::spawn::{Heart, Spawner, WeaponPickup, pickup_weapons, update_hearts};
use crate::world::{Hud, MapTransition, RunState};

#[derive(Clone, Debug, PartialEq)]
pub enum SimEvent {
    /// The player's death animation finished.
    GameOver { kills: u32, elapsed_ms: f64 },
    /// The player stepped onto an exit cell.
    MapExit(MapTransition),
}

/// One session on one map. Owns every entity on it; the clock is the sum
/// of the delta times it has been fed.
pub struct Simulation {
    config: Rc<SimConfig>,
    map: GameMap,
    run: RunState,
    now: f64,
    running: bool,
    /// Exit cell the player stands on without triggering it; cleared once
    /// they step off.
    exit_hold: Option<GridIndex>,
    player: Player,
    enemies: Vec<Enemy>,
    projectiles: Vec<Projectile>,
    explosions: Vec<Explosion>,
    traps: Vec<Trap>,
    hearts: Vec<Heart>,
    weapons: Vec<WeaponPickup>,
    spawn_points: Vec<Vec2>,
    spawner: Spawner,
}

impl Simulation {
    /// A fresh run starts asleep at the map spawn; arriving through an exit
    /// starts awake at the arrival cell.
    pub fn new(
        config: Rc<SimConfig>,
        map: GameMap,
        run: RunState,
        arrival: Option<GridIndex>,
    ) -> Self {
        let class = config.class(run.class);
        let start = map.tiles.cell_origin(arrival.unwrap_or(map.spawn));
        let mut player = Player::new(start, &config, class);
        player.health = run.health.clamp(0, player.max_health);
        player.weapon = run.weapon;
        if arrival.is_some() {
            player.set_state(PlayerState::Idle);
        }

        let weapons = map
            .weapons
            .iter()
            .map(|tile| WeaponPickup::from_tile(tile, &map.tiles, run.is_collected(&map.id, &tile.key)))
            .collect();
        let spawn_points: Vec<Vec2> = map
            .enemy_spawns
            .iter()
            .map(|&cell| map.tiles.cell_origin(cell))
            .collect();
        let enemies = spawn_points
            .first()
            .map(|&point| vec![Enemy::new(point, &config.enemy)])
            .unwrap_or_default();
        let spawner = Spawner::new(0.0, &config.spawn);

        Self {
            config,
            map,
            run,
            now: 0.0,
            running: true,
            exit_hold: arrival,
            player,
            enemies,
            projectiles: Vec::new(),
            explosions: Vec::new(),
            traps: Vec::new(),
            hearts: Vec::new(),
            weapons,
            spawn_points,
            spawner,
        }
    }

    /// Advances the session by `dt` seconds (capped at `max_frame_dt`).
    /// Returns an event when the session ends; after that it stays halted.
    pub fn update(&mut self, dt: f32, actions: &ActionSet, rng: &mut impl Rng) -> Option<SimEvent> {
        if !self.running {
            return None;
        }
        let cfg = Rc::clone(&self.config);
        let dt = dt.clamp(0.0, cfg.max_frame_dt);
        self.now += dt as f64 * 1000.0;
        self.run.elapsed_ms += dt as f64 * 1000.0;
        let now = self.now;
        let tile = cfg.tile_size;
        let frames = &cfg.player.frames;
        let solids = self.map.tiles.collision_blocks();

        if self
            .player
            .update_sleep(dt, actions.has_gameplay_input(), frames)
        {
            return None;
        }

        self.spawner.try_spawn_enemy(
            now,
            &mut self.enemies,
            &self.spawn_points,
            self.player.weapon.is_some(),
            &cfg,
            rng,
        );
        self.spawner.try_spawn_heart(
            now,
            &mut self.hearts,
            &self.map.tiles,
            &self.weapons,
            &cfg.spawn,
            rng,
        );

        let intent = actions.movement();
        if !self.player.is_locked() {
            self.player.face(intent.x);
        }
        if actions.contains(Action::Attack) && self.player.can_attack() {
            self.player.set_state(PlayerState::Attack { started_at: now });
            if let Some(projectile) = Projectile::fired_by(&self.player, &cfg.combat) {
                self.projectiles.push(projectile);
            }
        }
        self.player.apply_movement(intent, dt, solids);

        for key in pickup_weapons(&mut self.weapons, &mut self.player) {
            self.run.mark_collected(&self.map.id, &key);
        }
        update_hearts(&mut self.hearts, &mut self.player, now, &cfg.spawn);

        if self.player.animate(dt, frames) {
            self.running = false;
            self.sync_run();
            info!(
                "game over: {} kills in {:.1}s",
                self.run.kills,
                self.run.elapsed_ms / 1000.0
            );
            return Some(SimEvent::GameOver {
                kills: self.run.kills,
                elapsed_ms: self.run.elapsed_ms,
            });
        }
        self.player.update_timed_action(now, frames);

        let hits = HitContext {
            now,
            tile_size: tile,
            world_size: self.map.tiles.pixel_size(),
            solids,
            tuning: &cfg.combat,
        };
        let kills = &mut self.run.kills;

        if actions.contains(Action::Ability) && self.player.can_use_ability(now) {
            match self.player.ability {
                Ability::Blink => {
                    let blink = &cfg.combat.blink;
                    let target_x = self.player.blink_target(
                        blink.step_tiles * tile,
                        blink.max_tiles * tile,
                        solids,
                    );
                    self.player.set_state(PlayerState::Blink(BlinkInProgress {
                        started_at: now,
                        target_x,
                    }));
                }
                Ability::Trap => {
                    self.traps.push(Trap::at_feet(
                        &self.player,
                        tile,
                        now,
                        cfg.combat.trap.duration_ms,
                    ));
                }
                Ability::Slam => {
                    slam(&self.player, &mut self.enemies, &hits, kills);
                    self.player
                        .set_state(PlayerState::Ability { started_at: now });
                }
            }
            self.player.ability_used_at = Some(now);
        }

        let sight = EnemyContext {
            player: self.player.rect(),
            map: &self.map.tiles,
            solids,
            now,
            dt,
        };
        for enemy in &mut self.enemies {
            tick_damage_over_time(enemy, now, kills);
            enemy.update_ai(&sight, &cfg.enemy);
            enemy.animate(dt, &cfg.enemy.frames);
        }

        update_traps(&mut self.traps, &mut self.enemies, now, cfg.combat.trap.stun_ms);
        resolve_melee(&self.player, &mut self.enemies, &hits, kills);
        advance_projectiles(
            &mut self.projectiles,
            &mut self.enemies,
            dt,
            &hits,
            &mut self.explosions,
            kills,
        );
        resolve_enemy_attacks(
            &mut self.enemies,
            &mut self.player,
            now,
            cfg.player.invuln_ms,
            cfg.enemy.attack_ms,
        );
        separate_enemies(&mut self.enemies, solids);

        self.enemies.retain(|e| !e.dead);
        let lifetime = cfg.combat.fireball.explosion_ms;
        self.explosions.retain(|e| !e.is_expired(now, lifetime));
        self.sync_run();

        if self.player.state == PlayerState::Die || self.player.dead {
            return None;
        }
        let cell = self.map.tiles.cell_at(self.player.center());
        if let Some(hold) = self.exit_hold {
            if hold == cell {
                return None;
            }
            self.exit_hold = None;
        }
        let exit = self.map.exit_at(cell)?;
        self.running = false;
        info!("'{}' -> '{}'", self.map.id, exit.to);
        Some(SimEvent::MapExit(MapTransition {
            to_map: exit.to.clone(),
            arrive: exit.arrive,
        }))
    }

    fn sync_run(&mut self) {
        self.run.health = self.player.health;
        self.run.weapon = self.player.weapon;
    }

    pub fn hud(&self) -> Hud {
        Hud {
            class: self.config.class(self.run.class).name.clone(),
            map: self.map.name.clone(),
            health: self.player.health,
            max_health: self.player.max_health,
            weapon: self.player.weapon,
            kills: self.run.kills,
            elapsed_ms: self.run.elapsed_ms,
            game_over: self.player.dead,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Picks the session back up after a map exit that went nowhere. The
    /// exit under the player stays quiet until they step off it.
    pub fn resume(&mut self) {
        if self.running || self.player.dead {
            return;
        }
        self.running = true;
        self.exit_hold = Some(self.map.tiles.cell_at(self.player.center()));
    }

    /// Milliseconds since the session started.
    pub fn now(&self) -> f64 {
        self.now
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn map(&self) -> &GameMap {
        &self.map
    }

    pub fn run_state(&self) -> &RunState {
        &self.run
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut Player {
        &mut self.player
    }

    pub fn enemies(&self) -> &[Enemy] {
        &self.enemies
    }

    pub fn enemies_mut(&mut self) -> &mut Vec<Enemy> {
        &mut self.enemies
    }

    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    pub fn explosions(&self) -> &[Explosion] {
        &self.explosions
    }

    pub fn traps(&self) -> &[Trap] {
        &self.traps
    }

    pub fn hearts(&self) -> &[Heart] {
        &self.hearts
    }

    pub fn hearts_mut(&mut self) -> &mut Vec<Heart> {
        &mut self.hearts
    }

    pub fn weapons(&self) -> &[WeaponPickup] {
        &self.weapons
    }

    pub fn spawner_mut(&mut self) -> &mut Spawner {
        &mut self.spawner
    }
}
