use goblinslayer::map::{MapLoadError, TileMap};
use goblinslayer::player::Weapon;
use goblinslayer::{GameMap, GridIndex, MapRegistry};
use macroquad::math::{Rect, vec2};

const TILE: f32 = 32.0;

fn invalid(result: Result<GameMap, MapLoadError>) -> String {
    match result {
        Err(MapLoadError::Invalid(msg)) => msg,
        Err(other) => panic!("expected an invalid map, got {other}"),
        Ok(map) => panic!("map '{}' should not load", map.id),
    }
}

#[test]
fn builtin_maps_load_and_link_up() {
    let maps = MapRegistry::builtin(TILE).unwrap();
    assert_eq!(maps.len(), 2);
    assert_eq!(maps.first().map(|m| m.id.as_str()), Some("meadow"));

    let meadow = maps.get("meadow").unwrap();
    assert_eq!(meadow.name, "Meadow");
    assert_eq!(meadow.spawn, GridIndex::new(2, 2));
    assert_eq!(meadow.tiles.pixel_size(), vec2(12.0 * TILE, 10.0 * TILE));
    assert_eq!(meadow.weapons.len(), 3);
    assert_eq!(meadow.weapons[0].key, "sword:3:2");
    assert_eq!(meadow.weapons[1].kind, Weapon::Bow);

    let exit = meadow.exit_at(GridIndex::new(10, 1)).unwrap();
    assert_eq!(exit.to, "cellar");
    assert!(meadow.exit_at(GridIndex::new(9, 1)).is_none());

    let cellar = maps.get("cellar").unwrap();
    assert_eq!(cellar.weapons[0].key, "cellar-staff");
    assert!(cellar.tiles.is_walkable(exit.arrive));
}

#[test]
fn json_maps_use_the_same_layout() {
    let raw = r#"{
        "id": "pit",
        "grid": [[1, 1, 1], [1, 0, 1], [1, 1, 1]],
        "spawn": [1, 1],
        "weapons": [{ "kind": "staff", "cell": [1, 1] }]
    }"#;
    let map = GameMap::from_json_str(raw, TILE).unwrap();
    assert_eq!(map.name, "pit");
    assert_eq!(map.tiles.walkable_cells(), &[GridIndex::new(1, 1)]);
    assert_eq!(map.weapons[0].kind, Weapon::Staff);
    assert!(map.enemy_spawns.is_empty());
}

#[test]
fn malformed_grids_are_rejected() {
    let ragged = "id: r\ngrid:\n  - [0, 0, 0]\n  - [0, 0]\nspawn: [0, 0]\n";
    assert!(invalid(GameMap::from_yaml_str(ragged, TILE)).contains("row 1"));

    let unknown = "id: u\ngrid:\n  - [0, 2]\nspawn: [0, 0]\n";
    assert!(invalid(GameMap::from_yaml_str(unknown, TILE)).contains("unknown cell kind 2"));

    let empty = "id: e\ngrid: []\nspawn: [0, 0]\n";
    assert!(invalid(GameMap::from_yaml_str(empty, TILE)).contains("empty"));

    assert!(matches!(
        GameMap::from_yaml_str("id: [", TILE),
        Err(MapLoadError::Yaml(_))
    ));
}

#[test]
fn placements_must_be_walkable_and_unique() {
    let on_wall = "id: w\ngrid:\n  - [1, 0]\nspawn: [0, 0]\n";
    assert!(invalid(GameMap::from_yaml_str(on_wall, TILE)).contains("spawn"));

    let off_grid = "id: o\ngrid:\n  - [0, 0]\nspawn: [0, 0]\nenemy_spawns: [[5, 5]]\n";
    assert!(invalid(GameMap::from_yaml_str(off_grid, TILE)).contains("enemy spawn"));

    let twins = r#"
id: t
grid:
  - [0, 0]
spawn: [0, 0]
weapons:
  - { kind: bow, cell: [0, 0], key: loot }
  - { kind: sword, cell: [1, 0], key: loot }
"#;
    assert!(invalid(GameMap::from_yaml_str(twins, TILE)).contains("duplicate weapon key 'loot'"));
}

#[test]
fn exits_must_lead_somewhere_walkable() {
    let from = "id: from\ngrid:\n  - [0, 0]\nspawn: [0, 0]\nexits:\n  - { cell: [1, 0], to: to, arrive: [0, 0] }\n";
    let mut maps = MapRegistry::new();
    maps.insert(GameMap::from_yaml_str(from, TILE).unwrap());
    assert!(matches!(maps.validate(), Err(MapLoadError::Invalid(msg)) if msg.contains("unknown map 'to'")));

    let blocked = "id: to\ngrid:\n  - [1, 0]\nspawn: [1, 0]\n";
    maps.insert(GameMap::from_yaml_str(blocked, TILE).unwrap());
    assert!(matches!(maps.validate(), Err(MapLoadError::Invalid(msg)) if msg.contains("blocked cell")));

    let open = "id: to\ngrid:\n  - [0, 0]\nspawn: [1, 0]\n";
    maps.insert(GameMap::from_yaml_str(open, TILE).unwrap());
    assert_eq!(maps.len(), 2);
    assert!(maps.validate().is_ok());
}

#[test]
fn exits_must_not_arrive_on_exits() {
    let a = "id: a\ngrid:\n  - [0, 0]\nspawn: [0, 0]\nexits:\n  - { cell: [1, 0], to: b, arrive: [1, 0] }\n";
    let b = "id: b\ngrid:\n  - [0, 0]\nspawn: [0, 0]\nexits:\n  - { cell: [1, 0], to: a, arrive: [1, 0] }\n";
    let mut maps = MapRegistry::new();
    maps.insert(GameMap::from_yaml_str(a, TILE).unwrap());
    maps.insert(GameMap::from_yaml_str(b, TILE).unwrap());
    assert!(matches!(maps.validate(), Err(MapLoadError::Invalid(msg)) if msg.contains("exit cell (1, 0)")));

    let b = "id: b\ngrid:\n  - [0, 0]\nspawn: [0, 0]\nexits:\n  - { cell: [1, 0], to: a, arrive: [0, 0] }\n";
    maps.insert(GameMap::from_yaml_str(b, TILE).unwrap());
    assert!(matches!(maps.validate(), Err(MapLoadError::Invalid(msg)) if msg.contains("exit on 'a'")));

    let a = "id: a\ngrid:\n  - [0, 0]\nspawn: [0, 0]\nexits:\n  - { cell: [1, 0], to: b, arrive: [0, 0] }\n";
    maps.insert(GameMap::from_yaml_str(a, TILE).unwrap());
    assert!(maps.validate().is_ok());
}

#[test]
fn solid_cells_merge_into_few_blocks() {
    let rows: Vec<Vec<u8>> = vec![vec![1, 1, 1], vec![1, 0, 1], vec![1, 1, 1]];
    let map = TileMap::from_rows(&rows, TILE).unwrap();
    assert_eq!(
        map.collision_blocks(),
        &[
            Rect::new(0.0, 0.0, 96.0, 32.0),
            Rect::new(0.0, 32.0, 32.0, 64.0),
            Rect::new(64.0, 32.0, 32.0, 64.0),
            Rect::new(32.0, 64.0, 32.0, 32.0),
        ]
    );

    let open = TileMap::open(5, 5, TILE);
    assert!(open.collision_blocks().is_empty());
    assert_eq!(open.walkable_cells().len(), 25);
}

#[test]
fn out_of_bounds_counts_as_solid() {
    let map = TileMap::open(2, 2, TILE);
    assert!(map.is_solid_at(-1, 0));
    assert!(map.is_solid_at(2, 1));
    assert!(!map.is_solid_at(1, 1));
    assert_eq!(map.grid_index(vec2(70.0, 10.0)), None);
    assert_eq!(map.grid_index(vec2(40.0, 10.0)), Some(GridIndex::new(1, 0)));
    assert_eq!(map.cell_center(GridIndex::new(1, 0)), vec2(48.0, 16.0));
}

#[test]
fn load_from_reads_yaml_and_json_files() {
    let dir = std::env::temp_dir().join(format!("goblinslayer-maps-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(
        dir.join("a.yaml"),
        "id: a\ngrid:\n  - [0, 0]\nspawn: [0, 0]\nexits:\n  - { cell: [1, 0], to: b, arrive: [0, 0] }\n",
    )
    .unwrap();
    std::fs::write(dir.join("b.json"), r#"{"id": "b", "grid": [[0]], "spawn": [0, 0]}"#).unwrap();
    std::fs::write(dir.join("notes.txt"), "not a map").unwrap();

    let maps = MapRegistry::load_from(&dir, TILE).unwrap();
    assert_eq!(maps.ids().collect::<Vec<_>>(), vec!["a", "b"]);

    std::fs::remove_dir_all(&dir).unwrap();
    assert!(MapRegistry::load_from(&dir, TILE).unwrap().is_empty());
}
