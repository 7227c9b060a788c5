use log::{debug, info};
use macroquad::math::{Rect, Vec2, vec2};

use crate::collision::{hits_any, overlaps, penetration, resolve_move};
use crate::config::{CombatTuning, SlamTuning};
use crate::enemy::{DamageOverTime, DotKind, Enemy, EnemyState, Knockback};
use crate::player::{Facing, Player, PlayerState, Weapon};

/// Shared inputs of the hit resolution passes.
pub struct HitContext<'a> {
    pub now: f64,
    pub tile_size: f32,
    pub world_size: Vec2,
    pub solids: &'a [Rect],
    pub tuning: &'a CombatTuning,
}

/// The only place goblin health changes. Clamps at zero, stamps the hurt
/// time and counts the kill once, on the hit that starts the death.
/// Returns true if the hit landed.
pub fn damage_enemy(enemy: &mut Enemy, amount: i32, now: f64, kills: &mut u32) -> bool {
    if amount <= 0 || !enemy.is_active() {
        return false;
    }
    enemy.health = (enemy.health - amount).max(0);
    enemy.hurt_at = Some(now);
    if enemy.health == 0 {
        enemy.set_state(EnemyState::Die);
        enemy.dot = None;
        enemy.knockback = None;
        *kills += 1;
        info!("goblin killed ({kills} total)");
    }
    true
}

/// 14x12 box reaching out from the player's leading edge.
pub fn melee_hitbox(player: &Player) -> Rect {
    let (w, h) = (14.0, 12.0);
    let x = match player.facing {
        Facing::Right => player.pos.x + player.size.x - 4.0,
        Facing::Left => player.pos.x - w + 4.0,
    };
    let y = player.pos.y + player.size.y / 2.0 - h / 2.0;
    Rect::new(x, y, w, h)
}

/// Sword hits during an attack. A goblin can only be hit again once
/// `melee_rehit_ms` has passed since it was last hurt.
pub fn resolve_melee(player: &Player, enemies: &mut [Enemy], ctx: &HitContext, kills: &mut u32) {
    if !matches!(player.state, PlayerState::Attack { .. }) || player.weapon != Some(Weapon::Sword) {
        return;
    }
    let hitbox = melee_hitbox(player);
    for enemy in enemies.iter_mut().filter(|e| e.is_active()) {
        let rested = enemy
            .hurt_at
            .is_none_or(|t| ctx.now - t > ctx.tuning.melee_rehit_ms);
        if rested && overlaps(&hitbox, &enemy.hurtbox()) {
            damage_enemy(enemy, ctx.tuning.melee_damage, ctx.now, kills);
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProjectileKind {
    Arrow,
    Fireball,
}

/// `pos` is the centre of the projectile.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projectile {
    pub kind: ProjectileKind,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
}

impl Projectile {
    /// The projectile a ranged weapon fires, if any.
    pub fn fired_by(player: &Player, tuning: &CombatTuning) -> Option<Self> {
        let (kind, speed, radius) = match player.weapon? {
            Weapon::Bow => (ProjectileKind::Arrow, tuning.arrow.speed, tuning.arrow.radius),
            Weapon::Staff => (
                ProjectileKind::Fireball,
                tuning.fireball.speed,
                tuning.fireball.radius,
            ),
            Weapon::Sword => return None,
        };
        Some(Self {
            kind,
            pos: player.center(),
            vel: vec2(player.facing.sign() * speed, 0.0),
            radius,
        })
    }

    pub fn rect(&self) -> Rect {
        Rect::new(
            self.pos.x - self.radius,
            self.pos.y - self.radius,
            self.radius * 2.0,
            self.radius * 2.0,
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Explosion {
    pub pos: Vec2,
    pub radius: f32,
    pub created_at: f64,
}

impl Explosion {
    pub fn is_expired(&self, now: f64, lifetime_ms: f64) -> bool {
        now - self.created_at > lifetime_ms
    }

    /// Linear fade from 1 at creation to 0 at the end of its lifetime.
    pub fn alpha(&self, now: f64, lifetime_ms: f64) -> f32 {
        let t = (now - self.created_at) / lifetime_ms.max(1.0);
        (1.0 - t).clamp(0.0, 1.0) as f32
    }
}

/// Moves every projectile and resolves what it hits. Walls stop anything;
/// arrows hurt and poison the first goblin they touch; fireballs burst on
/// any impact. Projectiles more than a tile outside the map are dropped.
pub fn advance_projectiles(
    projectiles: &mut Vec<Projectile>,
    enemies: &mut [Enemy],
    dt: f32,
    ctx: &HitContext,
    explosions: &mut Vec<Explosion>,
    kills: &mut u32,
) {
    let margin = ctx.tile_size;
    projectiles.retain_mut(|p| {
        p.pos += p.vel * dt;
        let rect = p.rect();

        let mut hit = hits_any(&rect, ctx.solids);
        if !hit {
            if let Some(enemy) = enemies
                .iter_mut()
                .find(|e| e.is_active() && overlaps(&rect, &e.hurtbox()))
            {
                hit = true;
                if p.kind == ProjectileKind::Arrow {
                    let arrow = &ctx.tuning.arrow;
                    damage_enemy(enemy, arrow.hit_damage, ctx.now, kills);
                    if enemy.is_active() {
                        enemy.dot = Some(DamageOverTime {
                            kind: DotKind::Arrow,
                            damage: arrow.dot_damage,
                            ticks_left: arrow.dot_ticks,
                            next_tick_at: ctx.now + arrow.dot_interval_ms,
                            interval_ms: arrow.dot_interval_ms,
                        });
                    }
                }
            }
        }

        if hit {
            if p.kind == ProjectileKind::Fireball {
                explosions.push(detonate(p.pos, enemies, ctx, kills));
            }
            return false;
        }

        p.pos.x >= -margin
            && p.pos.y >= -margin
            && p.pos.x <= ctx.world_size.x + margin
            && p.pos.y <= ctx.world_size.y + margin
    });
}

/// Area damage around `at` against every goblin whose centre is in range.
fn detonate(at: Vec2, enemies: &mut [Enemy], ctx: &HitContext, kills: &mut u32) -> Explosion {
    let fireball = &ctx.tuning.fireball;
    let radius = fireball.aoe_radius_tiles * ctx.tile_size;
    for enemy in enemies.iter_mut().filter(|e| e.is_active()) {
        if enemy.center().distance(at) <= radius {
            damage_enemy(enemy, fireball.aoe_damage, ctx.now, kills);
        }
    }
    Explosion {
        pos: at,
        radius,
        created_at: ctx.now,
    }
}

/// Applies a due damage-over-time tick. The effect ends after its last tick
/// or when the goblin dies.
pub fn tick_damage_over_time(enemy: &mut Enemy, now: f64, kills: &mut u32) {
    let Some(mut dot) = enemy.dot else {
        return;
    };
    if dot.ticks_left == 0 || now < dot.next_tick_at || !enemy.is_active() {
        return;
    }

    damage_enemy(enemy, dot.damage, now, kills);
    dot.ticks_left -= 1;
    dot.next_tick_at += dot.interval_ms;
    enemy.dot = (dot.ticks_left > 0 && enemy.health > 0).then_some(dot);
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Trap {
    pub rect: Rect,
    pub created_at: f64,
    pub duration_ms: f64,
}

impl Trap {
    /// A thin strip at the player's feet.
    pub fn at_feet(player: &Player, tile_size: f32, now: f64, duration_ms: f64) -> Self {
        Self {
            rect: Rect::new(
                player.pos.x + player.size.x / 4.0,
                player.pos.y + player.size.y * 2.0 / 3.0,
                tile_size / 2.0,
                tile_size / 8.0,
            ),
            created_at: now,
            duration_ms,
        }
    }

    pub fn is_expired(&self, now: f64) -> bool {
        now - self.created_at > self.duration_ms
    }
}

/// Expires old traps and springs the rest. Each trap stuns the first goblin
/// that touches it and is consumed.
pub fn update_traps(traps: &mut Vec<Trap>, enemies: &mut [Enemy], now: f64, stun_ms: f64) {
    traps.retain(|trap| {
        if trap.is_expired(now) {
            return false;
        }
        match enemies
            .iter_mut()
            .find(|e| !e.dead && overlaps(&e.hurtbox(), &trap.rect))
        {
            Some(enemy) => {
                debug!("trap sprung at ({:.0}, {:.0})", trap.rect.x, trap.rect.y);
                enemy.stun(now + stun_ms);
                false
            }
            None => true,
        }
    });
}

/// Warrior slam: damages every goblin within range of the player's centre
/// and shoves it outward, stunned for as long as the shove lasts.
pub fn slam(player: &Player, enemies: &mut [Enemy], ctx: &HitContext, kills: &mut u32) {
    let SlamTuning {
        radius_tiles,
        knockback_tiles,
        knockback_ms,
        damage,
    } = ctx.tuning.slam;
    let radius = radius_tiles * ctx.tile_size;
    let speed = knockback_tiles * ctx.tile_size / (knockback_ms as f32 / 1000.0).max(0.001);
    let origin = player.center();

    for enemy in enemies.iter_mut().filter(|e| e.is_active()) {
        let offset = enemy.center() - origin;
        let dist = offset.length();
        if dist > radius {
            continue;
        }
        damage_enemy(enemy, damage, ctx.now, kills);
        if !enemy.is_active() {
            continue;
        }
        let len = if dist > 0.0 { dist } else { 1.0 };
        enemy.knockback = Some(Knockback {
            velocity: offset / len * speed,
            until: ctx.now + knockback_ms,
        });
        enemy.stun(ctx.now + knockback_ms);
    }
}

/// Goblins mid-attack hurt the player when their forward box touches the
/// body, then fall back to idle once the attack has run its course.
/// Returns true if the player was hit.
pub fn resolve_enemy_attacks(
    enemies: &mut [Enemy],
    player: &mut Player,
    now: f64,
    invuln_ms: f64,
    attack_ms: f64,
) -> bool {
    let mut hit = false;
    for enemy in enemies.iter_mut() {
        if enemy.dead || !matches!(enemy.state, EnemyState::Attack { .. }) || player.dead {
            continue;
        }
        if !player.is_invulnerable(now, invuln_ms)
            && overlaps(&enemy.attack_hitbox(), &player.rect())
            && player.take_damage(1, now)
        {
            debug!("player hit, {} hp left", player.health);
            hit = true;
        }
        enemy.finish_attack(now, attack_ms);
    }
    hit
}

/// Pushes overlapping goblins apart, each by half the shallower overlap
/// axis, along the line between their centres.
pub fn separate_enemies(enemies: &mut [Enemy], solids: &[Rect]) {
    for i in 0..enemies.len() {
        let (head, tail) = enemies.split_at_mut(i + 1);
        let a = &mut head[i];
        if !a.is_active() {
            continue;
        }
        for b in tail.iter_mut().filter(|e| e.is_active()) {
            let Some(depth) = penetration(&a.rect(), &b.rect()) else {
                continue;
            };
            let push = depth.x.min(depth.y) / 2.0;
            let dir = (b.center() - a.center()).try_normalize().unwrap_or(vec2(1.0, 0.0));
            let shift = dir * push;
            a.pos = resolve_move(a.rect(), -shift.x, -shift.y, solids);
            b.pos = resolve_move(b.rect(), shift.x, shift.y, solids);
        }
    }
}
