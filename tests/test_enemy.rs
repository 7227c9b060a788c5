use goblinslayer::collision::hits_any;
use goblinslayer::config::EnemyTuning;
use goblinslayer::enemy::{Enemy, EnemyContext, EnemyState, Knockback};
use goblinslayer::map::TileMap;
use goblinslayer::player::Facing;
use macroquad::math::{Rect, vec2};

const TILE: f32 = 32.0;

fn walled(width: usize, height: usize, wall_x: usize, rows: std::ops::Range<usize>) -> TileMap {
    let mut solid = vec![false; width * height];
    for y in rows {
        solid[y * width + wall_x] = true;
    }
    TileMap::new(width, height, TILE, solid)
}

fn ctx<'a>(map: &'a TileMap, player: Rect, now: f64, dt: f32) -> EnemyContext<'a> {
    EnemyContext {
        player,
        map,
        solids: map.collision_blocks(),
        now,
        dt,
    }
}

#[test]
fn goblin_wakes_up_on_sight() {
    let tuning = EnemyTuning::default();
    let map = TileMap::open(8, 3, TILE);
    let player = Rect::new(200.0, 40.0, 16.0, 24.0);
    let mut goblin = Enemy::new(vec2(40.0, 40.0), &tuning);

    goblin.update_ai(&ctx(&map, player, 16.0, 0.1), &tuning);
    assert!(goblin.ai.has_seen_player);
    assert_eq!(goblin.state, EnemyState::Run);
    assert_eq!(goblin.facing, Facing::Right);
    assert!(goblin.pos.x > 40.0);
}

#[test]
fn wall_hides_the_player_until_seen_once() {
    let tuning = EnemyTuning::default();
    let wall = walled(8, 3, 4, 0..3);
    let open = TileMap::open(8, 3, TILE);
    let player = Rect::new(200.0, 40.0, 16.0, 24.0);
    let mut goblin = Enemy::new(vec2(40.0, 40.0), &tuning);

    for i in 0..10 {
        goblin.update_ai(&ctx(&wall, player, i as f64 * 16.0, 0.016), &tuning);
    }
    assert!(!goblin.ai.has_seen_player);
    assert_eq!(goblin.state, EnemyState::Idle);
    assert_eq!(goblin.pos, vec2(40.0, 40.0));

    goblin.update_ai(&ctx(&open, player, 200.0, 0.016), &tuning);
    assert!(goblin.ai.has_seen_player);

    // Awareness sticks even with the view blocked again
    let before = goblin.pos;
    goblin.update_ai(&ctx(&wall, player, 216.0, 0.016), &tuning);
    assert_eq!(goblin.state, EnemyState::Run);
    assert_ne!(goblin.pos, before);
}

#[test]
fn stunned_goblin_stands_still() {
    let tuning = EnemyTuning::default();
    let map = TileMap::open(8, 8, TILE);
    let player = Rect::new(200.0, 40.0, 16.0, 24.0);
    let mut goblin = Enemy::new(vec2(40.0, 40.0), &tuning);
    goblin.ai.has_seen_player = true;
    goblin.stun(1000.0);

    goblin.update_ai(&ctx(&map, player, 500.0, 0.1), &tuning);
    assert_eq!(goblin.pos, vec2(40.0, 40.0));
    assert_eq!(goblin.state, EnemyState::Idle);

    goblin.update_ai(&ctx(&map, player, 1000.0, 0.1), &tuning);
    assert!(goblin.pos.x > 40.0);
}

#[test]
fn knockback_overrides_the_ai() {
    let tuning = EnemyTuning::default();
    let map = TileMap::open(8, 8, TILE);
    // Player to the left: the AI would walk the other way
    let player = Rect::new(0.0, 40.0, 16.0, 24.0);
    let mut goblin = Enemy::new(vec2(100.0, 40.0), &tuning);
    goblin.ai.has_seen_player = true;
    goblin.stun(2000.0);
    goblin.knockback = Some(Knockback {
        velocity: vec2(100.0, 0.0),
        until: 1000.0,
    });

    goblin.update_ai(&ctx(&map, player, 500.0, 0.1), &tuning);
    assert!((goblin.pos.x - 110.0).abs() < 1e-4);
    assert!(goblin.knockback.is_some());

    // Expired knockback is dropped and the stun takes over
    goblin.update_ai(&ctx(&map, player, 1000.0, 0.1), &tuning);
    assert!(goblin.knockback.is_none());
    assert!((goblin.pos.x - 110.0).abs() < 1e-4);
}

#[test]
fn goblin_attacks_in_range_then_recovers() {
    let tuning = EnemyTuning::default();
    let map = TileMap::open(8, 8, TILE);
    let player = Rect::new(90.0, 100.0, 16.0, 24.0);
    let mut goblin = Enemy::new(vec2(100.0, 100.0), &tuning);
    goblin.ai.has_seen_player = true;

    goblin.update_ai(&ctx(&map, player, 50.0, 0.016), &tuning);
    assert_eq!(goblin.state, EnemyState::Attack { started_at: 50.0 });
    assert_eq!(goblin.facing, Facing::Left);
    assert_eq!(goblin.pos, vec2(100.0, 100.0));

    // The swing is not restarted while it plays out
    goblin.update_ai(&ctx(&map, player, 100.0, 0.016), &tuning);
    assert_eq!(goblin.state, EnemyState::Attack { started_at: 50.0 });

    goblin.finish_attack(350.0, tuning.attack_ms);
    assert!(matches!(goblin.state, EnemyState::Attack { .. }));
    goblin.finish_attack(351.0, tuning.attack_ms);
    assert_eq!(goblin.state, EnemyState::Idle);
}

#[test]
fn goblin_routes_around_a_wall() {
    let tuning = EnemyTuning::default();
    // Column 3 is solid except for the bottom row
    let map = walled(7, 5, 3, 0..4);
    let player = Rect::new(160.0, 0.0, 16.0, 24.0);
    let mut goblin = Enemy::new(vec2(32.0, 0.0), &tuning);
    goblin.ai.has_seen_player = true;

    let dt = 0.033;
    let mut now = 0.0;
    for _ in 0..2000 {
        now += 33.0;
        goblin.update_ai(&ctx(&map, player, now, dt), &tuning);
        assert!(
            !hits_any(&goblin.rect(), map.collision_blocks()),
            "goblin clipped into the wall at {:?}",
            goblin.pos
        );
        if matches!(goblin.state, EnemyState::Attack { .. }) {
            break;
        }
    }

    assert!(matches!(goblin.state, EnemyState::Attack { .. }));
    assert!(map.cell_at(goblin.center()).x >= 4);
}

#[test]
fn death_animation_marks_the_goblin_dead() {
    let tuning = EnemyTuning::default();
    let mut goblin = Enemy::new(vec2(0.0, 0.0), &tuning);
    goblin.set_state(EnemyState::Die);
    assert!(!goblin.is_active());

    let mut finished = 0;
    for _ in 0..100 {
        if goblin.animate(0.05, &tuning.frames) {
            finished += 1;
        }
    }
    assert_eq!(finished, 1);
    assert!(goblin.dead);
}
