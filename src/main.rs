use ::rand::SeedableRng;
use ::rand::rngs::StdRng;
use log::{error, info, warn};
use macroquad::prelude::*;
use std::collections::HashMap;
use std::rc::Rc;

use goblinslayer::animation::{GoblinSheet, goblin_sheet, player_sprite_row};
use goblinslayer::collision::center;
use goblinslayer::combat::{ProjectileKind, melee_hitbox};
use goblinslayer::frame::{Clock, FrameLoop};
use goblinslayer::player::{Facing, PlayerClass, PlayerState, Weapon};
use goblinslayer::{Action, ActionSet, MapRegistry, SimConfig, SimEvent, World};

const VIEW_W: f32 = 320.0;
const VIEW_H: f32 = 240.0;
const CAMERA_DRAG: f32 = 10.0;
const FRAME_W: f32 = 16.0;
const FRAME_H: f32 = 24.0;

const FLOOR: u32 = 0x2e6b3c;
const WALL: u32 = 0x2a2f38;
const EXIT: u32 = 0x6a3d9a;

fn window_conf() -> Conf {
    Conf {
        window_title: "goblinslayer".to_owned(),
        window_width: (VIEW_W * 3.0) as i32,
        window_height: (VIEW_H * 3.0) as i32,
        sample_count: 1,
        ..Default::default()
    }
}

struct MacroquadClock;

impl Clock for MacroquadClock {
    fn now_secs(&self) -> f64 {
        get_time()
    }
}

#[derive(Default)]
struct Sprites {
    players: HashMap<PlayerClass, Texture2D>,
    goblins: HashMap<GoblinSheet, Texture2D>,
    weapons: HashMap<Weapon, Texture2D>,
    heart: Option<Texture2D>,
}

impl Sprites {
    async fn load(dir: &str) -> Self {
        let mut sprites = Self::default();
        for class in PlayerClass::ALL {
            let name = format!("{class:?}").to_lowercase();
            if let Some(tex) = load_optional(&format!("{dir}/player/{name}.png")).await {
                sprites.players.insert(class, tex);
            }
        }
        for sheet in [GoblinSheet::Idle, GoblinSheet::Run, GoblinSheet::Attack, GoblinSheet::Die] {
            if let Some(tex) = load_optional(&format!("{dir}/goblin/{}.png", sheet.file_stem())).await {
                sprites.goblins.insert(sheet, tex);
            }
        }
        for weapon in [Weapon::Sword, Weapon::Bow, Weapon::Staff] {
            if let Some(tex) = load_optional(&format!("{dir}/items/{}.png", weapon.name())).await {
                sprites.weapons.insert(weapon, tex);
            }
        }
        sprites.heart = load_optional(&format!("{dir}/items/heart.png")).await;
        sprites
    }
}

async fn load_optional(path: &str) -> Option<Texture2D> {
    match load_texture(path).await {
        Ok(tex) => {
            tex.set_filter(FilterMode::Nearest);
            Some(tex)
        }
        Err(_) => None,
    }
}

struct Game {
    world: World,
    camera_target: Vec2,
}

struct Args {
    config: Option<String>,
    maps: Option<String>,
    assets: String,
}

fn parse_args() -> Args {
    let mut args = Args {
        config: None,
        maps: None,
        assets: "assets".to_owned(),
    };
    let mut iter = std::env::args().skip(1);
    while let Some(flag) = iter.next() {
        match flag.as_str() {
            "--config" => args.config = iter.next(),
            "--maps" => args.maps = iter.next(),
            "--assets" => {
                if let Some(dir) = iter.next() {
                    args.assets = dir;
                }
            }
            other => warn!("ignoring unknown argument '{other}'"),
        }
    }
    args
}

fn load_config(path: Option<&str>) -> SimConfig {
    let Some(path) = path else {
        return SimConfig::default();
    };
    SimConfig::load_from(path).unwrap_or_else(|err| {
        warn!("config load failed ({path}): {err}, using defaults");
        SimConfig::default()
    })
}

fn load_maps(dir: Option<&str>, tile_size: f32) -> Option<MapRegistry> {
    if let Some(dir) = dir {
        match MapRegistry::load_from(dir, tile_size) {
            Ok(maps) if !maps.is_empty() => return Some(maps),
            Ok(_) => warn!("no maps found in {dir}, using built-in maps"),
            Err(err) => warn!("map load failed ({dir}): {err}, using built-in maps"),
        }
    }
    MapRegistry::builtin(tile_size)
        .map_err(|err| error!("built-in maps are broken: {err}"))
        .ok()
}

fn gather_actions() -> ActionSet {
    let mut actions = ActionSet::new();
    let bindings = [
        (KeyCode::Left, Action::MoveLeft),
        (KeyCode::A, Action::MoveLeft),
        (KeyCode::Right, Action::MoveRight),
        (KeyCode::D, Action::MoveRight),
        (KeyCode::Up, Action::MoveUp),
        (KeyCode::W, Action::MoveUp),
        (KeyCode::Down, Action::MoveDown),
        (KeyCode::S, Action::MoveDown),
        (KeyCode::Space, Action::Attack),
        (KeyCode::Enter, Action::Attack),
        (KeyCode::Q, Action::Ability),
        (KeyCode::R, Action::Restart),
    ];
    for (key, action) in bindings {
        if is_key_down(key) {
            actions.press(action);
        }
    }
    actions
}

fn class_hotkey() -> Option<PlayerClass> {
    [KeyCode::Key1, KeyCode::Key2, KeyCode::Key3]
        .into_iter()
        .zip(PlayerClass::ALL)
        .find(|(key, _)| is_key_pressed(*key))
        .map(|(_, class)| class)
}

#[macroquad::main(window_conf)]
async fn main() {
    env_logger::init();

    let args = parse_args();
    let config = Rc::new(load_config(args.config.as_deref()));
    let Some(maps) = load_maps(args.maps.as_deref(), config.tile_size) else {
        return;
    };
    info!("maps: {}", maps.ids().collect::<Vec<_>>().join(", "));

    let seed = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let rng = StdRng::seed_from_u64(seed);
    let world = match World::new(Rc::clone(&config), maps, PlayerClass::Wizard, rng) {
        Ok(world) => world,
        Err(err) => {
            error!("cannot start: {err}");
            return;
        }
    };
    let sprites = Sprites::load(&args.assets).await;

    let start = world.simulation().player().center();
    let mut game = Game {
        world,
        camera_target: start,
    };
    let clock = MacroquadClock;
    let mut frame = FrameLoop::new(clock.now_secs(), config.max_frame_dt);

    loop {
        if is_key_pressed(KeyCode::Escape) {
            frame.cancel();
        }
        let running = frame.tick(
            clock.now_secs(),
            &mut game,
            |game, dt| {
                if let Some(class) = class_hotkey() {
                    game.world.select_class(class);
                }
                let actions = gather_actions();
                if let Some(SimEvent::GameOver { kills, elapsed_ms }) = game.world.step(dt, &actions) {
                    info!("final score: {kills} kills, {:.1}s", elapsed_ms / 1000.0);
                }
                follow_player(game, dt);
            },
            |game| draw(game, &sprites),
        );
        if !running {
            break;
        }
        next_frame().await;
    }
}

fn follow_player(game: &mut Game, dt: f32) {
    let sim = game.world.simulation();
    let world_size = sim.map().tiles.pixel_size();
    let target = sim.player().center();
    let follow = 1.0 - (-CAMERA_DRAG * dt).exp();
    let next = game.camera_target + (target - game.camera_target) * follow;
    game.camera_target = clamp_camera(next, world_size);
}

/// Keeps the view inside the map; maps smaller than the view are centred.
fn clamp_camera(target: Vec2, world: Vec2) -> Vec2 {
    let axis = |t: f32, world: f32, view: f32| {
        if world <= view {
            world * 0.5
        } else {
            t.clamp(view * 0.5, world - view * 0.5)
        }
    };
    vec2(axis(target.x, world.x, VIEW_W), axis(target.y, world.y, VIEW_H))
}

fn draw(game: &Game, sprites: &Sprites) {
    let sim = game.world.simulation();
    let cfg = sim.config();
    let now = sim.now();
    let tiles = &sim.map().tiles;
    let tile = tiles.tile_size();

    let camera = Camera2D {
        target: vec2(game.camera_target.x.round(), game.camera_target.y.round()),
        zoom: vec2(2.0 / VIEW_W, 2.0 / VIEW_H),
        ..Default::default()
    };
    set_camera(&camera);
    clear_background(Color::from_hex(0x223b27));

    for y in 0..tiles.height() as i32 {
        for x in 0..tiles.width() as i32 {
            let color = if tiles.is_solid_at(x, y) { WALL } else { FLOOR };
            draw_rectangle(x as f32 * tile, y as f32 * tile, tile, tile, Color::from_hex(color));
        }
    }
    for exit in &sim.map().exits {
        let r = tiles.tile_bounds(exit.cell);
        draw_rectangle(r.x + 2.0, r.y + 2.0, r.w - 4.0, r.h - 4.0, Color::from_hex(EXIT));
    }

    for weapon in sim.weapons().iter().filter(|w| !w.picked) {
        let r = weapon.rect;
        match sprites.weapons.get(&weapon.kind) {
            Some(tex) => draw_texture_ex(tex, r.x, r.y, WHITE, sized(r.w, r.h)),
            None => draw_rectangle(r.x, r.y, r.w, r.h, GOLD),
        }
    }
    for heart in sim.hearts() {
        let r = heart.rect;
        match &sprites.heart {
            Some(tex) => draw_texture_ex(tex, r.x, r.y, WHITE, sized(r.w, r.h)),
            None => draw_rectangle(r.x, r.y, r.w, r.h, RED),
        }
    }
    for trap in sim.traps() {
        let r = trap.rect;
        draw_rectangle(r.x, r.y, r.w, r.h, BROWN);
    }

    for enemy in sim.enemies() {
        let r = enemy.rect();
        let sheet = goblin_sheet(&enemy.state);
        match sprites.goblins.get(&sheet) {
            Some(tex) => draw_frame(tex, enemy.anim.frame, 0, r, enemy.facing),
            None => draw_rectangle(r.x, r.y, r.w, r.h, DARKGREEN),
        }
    }

    let player = sim.player();
    if !player.dead {
        let r = player.rect();
        match sprites.players.get(&sim.run_state().class) {
            Some(tex) => {
                let row = player_sprite_row(&player.state, player.weapon, player.ability);
                draw_frame(tex, player.anim.frame, row, r, player.facing);
            }
            None => draw_rectangle(r.x, r.y, r.w, r.h, SKYBLUE),
        }
        if matches!(player.state, PlayerState::Attack { .. }) && player.weapon == Some(Weapon::Sword) {
            let hb = melee_hitbox(player);
            draw_rectangle(hb.x, hb.y, hb.w, hb.h, Color::new(1.0, 0.83, 0.29, 0.25));
        }
    }

    for projectile in sim.projectiles() {
        let color = match projectile.kind {
            ProjectileKind::Arrow => LIGHTGRAY,
            ProjectileKind::Fireball => ORANGE,
        };
        draw_circle(projectile.pos.x, projectile.pos.y, projectile.radius, color);
    }
    let lifetime = cfg.combat.fireball.explosion_ms;
    for explosion in sim.explosions() {
        let alpha = explosion.alpha(now, lifetime);
        draw_circle(
            explosion.pos.x,
            explosion.pos.y,
            explosion.radius,
            Color::new(1.0, 0.6, 0.0, alpha * 0.8),
        );
    }

    set_default_camera();
    draw_hud(game);
}

fn draw_hud(game: &Game) {
    let hud = game.world.hud();
    let weapon = hud.weapon.map(Weapon::name).unwrap_or("none");
    let lines = [
        format!("{} - {}", hud.class, hud.map),
        format!("HP {}/{}  weapon: {weapon}", hud.health, hud.max_health),
        format!("kills {}  time {:.1}s", hud.kills, hud.elapsed_ms / 1000.0),
    ];
    for (i, line) in lines.iter().enumerate() {
        draw_text(line, 20.0, 30.0 + i as f32 * 24.0, 24.0, WHITE);
    }

    let player = game.world.simulation().player();
    if player.state == PlayerState::Sleep {
        draw_centered("press any key", 32.0);
    }
    if hud.game_over {
        draw_rectangle(0.0, 0.0, screen_width(), screen_height(), Color::new(0.0, 0.0, 0.0, 0.6));
        draw_centered(&format!("game over - {} kills - R to restart", hud.kills), 32.0);
    }
    draw_text("1 warrior  2 rogue  3 wizard", 20.0, screen_height() - 20.0, 20.0, GRAY);
}

fn draw_centered(text: &str, size: f32) {
    let dims = measure_text(text, None, size as u16, 1.0);
    draw_text(
        text,
        (screen_width() - dims.width) * 0.5,
        screen_height() * 0.5,
        size,
        WHITE,
    );
}

fn sized(w: f32, h: f32) -> DrawTextureParams {
    DrawTextureParams {
        dest_size: Some(vec2(w, h)),
        ..Default::default()
    }
}

/// Draws one cell of a sprite sheet laid out in 16x24 frames.
fn draw_frame(tex: &Texture2D, frame: u32, row: u32, body: Rect, facing: Facing) {
    let source = Rect::new(frame as f32 * FRAME_W, row as f32 * FRAME_H, FRAME_W, FRAME_H);
    let origin = center(&body) - vec2(FRAME_W, FRAME_H) * 0.5;
    draw_texture_ex(
        tex,
        origin.x,
        origin.y,
        WHITE,
        DrawTextureParams {
            source: Some(source),
            dest_size: Some(vec2(FRAME_W, FRAME_H)),
            flip_x: facing == Facing::Left,
            ..Default::default()
        },
    );
}
