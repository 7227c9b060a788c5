use macroquad::math::{Rect, Vec2, vec2};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::player::Weapon;

const WALKABLE: u8 = 0;
const SOLID: u8 = 1;

const BUILTIN_MAPS: [&str; 2] = [
    include_str!("maps/meadow.yaml"),
    include_str!("maps/cellar.yaml"),
];

#[derive(Debug)]
pub enum MapLoadError {
    Io(std::io::Error),
    Yaml(serde_yaml::Error),
    Json(serde_json::Error),
    Invalid(String),
}

impl std::fmt::Display for MapLoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "io error: {err}"),
            Self::Yaml(err) => write!(f, "yaml error: {err}"),
            Self::Json(err) => write!(f, "json error: {err}"),
            Self::Invalid(err) => write!(f, "invalid map: {err}"),
        }
    }
}

impl std::error::Error for MapLoadError {}

impl From<std::io::Error> for MapLoadError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_yaml::Error> for MapLoadError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Yaml(err)
    }
}

impl From<serde_json::Error> for MapLoadError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[i32; 2]", into = "[i32; 2]")]
pub struct GridIndex {
    pub x: i32,
    pub y: i32,
}

impl GridIndex {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn from_position(position: Vec2, tile_size: f32) -> Self {
        Self {
            x: (position.x / tile_size).floor() as i32,
            y: (position.y / tile_size).floor() as i32,
        }
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    pub fn chebyshev(self, other: GridIndex) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }
}

impl From<[i32; 2]> for GridIndex {
    fn from([x, y]: [i32; 2]) -> Self {
        Self { x, y }
    }
}

impl From<GridIndex> for [i32; 2] {
    fn from(cell: GridIndex) -> Self {
        [cell.x, cell.y]
    }
}

/// Static collision grid of one map.
#[derive(Clone, Debug)]
pub struct TileMap {
    width: usize,
    height: usize,
    tile_size: f32,
    solid: Vec<bool>,
    collision_blocks: Vec<Rect>,
    walkable: Vec<GridIndex>,
}

impl TileMap {
    pub fn new(width: usize, height: usize, tile_size: f32, solid: Vec<bool>) -> Self {
        let mut map = Self {
            width,
            height,
            tile_size,
            solid,
            collision_blocks: Vec::new(),
            walkable: Vec::new(),
        };
        map.solid.resize(width * height, true);
        map.rebuild_collision_blocks();
        map.rebuild_walkable();
        map
    }

    /// An all-walkable grid.
    pub fn open(width: usize, height: usize, tile_size: f32) -> Self {
        Self::new(width, height, tile_size, vec![false; width * height])
    }

    pub fn from_rows(rows: &[Vec<u8>], tile_size: f32) -> Result<Self, MapLoadError> {
        let height = rows.len();
        let width = rows.first().map(Vec::len).unwrap_or(0);
        if width == 0 || height == 0 {
            return Err(MapLoadError::Invalid("grid is empty".to_owned()));
        }

        let mut solid = Vec::with_capacity(width * height);
        for (y, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(MapLoadError::Invalid(format!(
                    "row {y} has {} cells, expected {width}",
                    row.len()
                )));
            }
            for (x, &kind) in row.iter().enumerate() {
                match kind {
                    WALKABLE => solid.push(false),
                    SOLID => solid.push(true),
                    other => {
                        return Err(MapLoadError::Invalid(format!(
                            "unknown cell kind {other} at ({x}, {y})"
                        )));
                    }
                }
            }
        }

        Ok(Self::new(width, height, tile_size, solid))
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn tile_size(&self) -> f32 {
        self.tile_size
    }

    pub fn pixel_size(&self) -> Vec2 {
        vec2(
            self.width as f32 * self.tile_size,
            self.height as f32 * self.tile_size,
        )
    }

    pub fn in_bounds(&self, cell: GridIndex) -> bool {
        cell.x >= 0 && cell.y >= 0 && (cell.x as usize) < self.width && (cell.y as usize) < self.height
    }

    /// Cells outside the grid count as solid.
    pub fn is_solid_at(&self, x: i32, y: i32) -> bool {
        let cell = GridIndex::new(x, y);
        if !self.in_bounds(cell) {
            return true;
        }
        self.solid[self.idx(x as usize, y as usize)]
    }

    pub fn is_walkable(&self, cell: GridIndex) -> bool {
        !self.is_solid_at(cell.x, cell.y)
    }

    pub fn collision_blocks(&self) -> &[Rect] {
        &self.collision_blocks
    }

    pub fn walkable_cells(&self) -> &[GridIndex] {
        &self.walkable
    }

    pub fn cell_at(&self, position: Vec2) -> GridIndex {
        GridIndex::from_position(position, self.tile_size)
    }

    pub fn grid_index(&self, position: Vec2) -> Option<GridIndex> {
        let cell = self.cell_at(position);
        self.in_bounds(cell).then_some(cell)
    }

    pub fn cell_origin(&self, cell: GridIndex) -> Vec2 {
        vec2(
            cell.x as f32 * self.tile_size,
            cell.y as f32 * self.tile_size,
        )
    }

    pub fn cell_center(&self, cell: GridIndex) -> Vec2 {
        self.cell_origin(cell) + Vec2::splat(self.tile_size * 0.5)
    }

    pub fn tile_bounds(&self, cell: GridIndex) -> Rect {
        let origin = self.cell_origin(cell);
        Rect::new(origin.x, origin.y, self.tile_size, self.tile_size)
    }

    fn idx(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    fn rebuild_walkable(&mut self) {
        self.walkable.clear();
        for y in 0..self.height {
            for x in 0..self.width {
                if !self.solid[self.idx(x, y)] {
                    self.walkable.push(GridIndex::new(x as i32, y as i32));
                }
            }
        }
    }

    // Greedy merge of solid cells into as few rectangles as possible.
    fn rebuild_collision_blocks(&mut self) {
        self.collision_blocks.clear();
        let mut visited = vec![false; self.solid.len()];

        for y in 0..self.height {
            for x in 0..self.width {
                let i = self.idx(x, y);
                if visited[i] || !self.solid[i] {
                    continue;
                }

                let mut max_w = 0;
                while x + max_w < self.width {
                    let idx = self.idx(x + max_w, y);
                    if self.solid[idx] && !visited[idx] {
                        max_w += 1;
                    } else {
                        break;
                    }
                }

                let mut max_h = 1;
                'height: loop {
                    if y + max_h >= self.height {
                        break;
                    }
                    for tx in 0..max_w {
                        let idx = self.idx(x + tx, y + max_h);
                        if !self.solid[idx] || visited[idx] {
                            break 'height;
                        }
                    }
                    max_h += 1;
                }

                for dy in 0..max_h {
                    for dx in 0..max_w {
                        visited[self.idx(x + dx, y + dy)] = true;
                    }
                }

                self.collision_blocks.push(Rect::new(
                    x as f32 * self.tile_size,
                    y as f32 * self.tile_size,
                    max_w as f32 * self.tile_size,
                    max_h as f32 * self.tile_size,
                ));
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct WeaponTile {
    pub key: String,
    pub kind: Weapon,
    pub cell: GridIndex,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExitZone {
    pub cell: GridIndex,
    pub to: String,
    pub arrive: GridIndex,
}

#[derive(Clone, Debug)]
pub struct GameMap {
    pub id: String,
    pub name: String,
    pub tiles: TileMap,
    pub spawn: GridIndex,
    pub enemy_spawns: Vec<GridIndex>,
    pub weapons: Vec<WeaponTile>,
    pub exits: Vec<ExitZone>,
}

impl GameMap {
    pub fn from_yaml_str(raw: &str, tile_size: f32) -> Result<Self, MapLoadError> {
        let file: MapFile = serde_yaml::from_str(raw)?;
        Self::from_file(file, tile_size)
    }

    pub fn from_json_str(raw: &str, tile_size: f32) -> Result<Self, MapLoadError> {
        let file: MapFile = serde_json::from_str(raw)?;
        Self::from_file(file, tile_size)
    }

    fn from_file(raw: MapFile, tile_size: f32) -> Result<Self, MapLoadError> {
        let tiles = TileMap::from_rows(&raw.grid, tile_size)?;

        let check_walkable = |what: &str, cell: GridIndex| {
            if tiles.is_walkable(cell) {
                Ok(())
            } else {
                Err(MapLoadError::Invalid(format!(
                    "{what} ({}, {}) on map '{}' is not a walkable cell",
                    cell.x, cell.y, raw.id
                )))
            }
        };

        check_walkable("spawn", raw.spawn)?;
        for &cell in &raw.enemy_spawns {
            check_walkable("enemy spawn", cell)?;
        }

        let mut weapons = Vec::with_capacity(raw.weapons.len());
        for weapon in raw.weapons {
            check_walkable("weapon tile", weapon.cell)?;
            let key = weapon.key.unwrap_or_else(|| {
                format!("{}:{}:{}", weapon.kind.name(), weapon.cell.x, weapon.cell.y)
            });
            if weapons.iter().any(|w: &WeaponTile| w.key == key) {
                return Err(MapLoadError::Invalid(format!(
                    "duplicate weapon key '{key}' on map '{}'",
                    raw.id
                )));
            }
            weapons.push(WeaponTile {
                key,
                kind: weapon.kind,
                cell: weapon.cell,
            });
        }

        let mut exits = Vec::with_capacity(raw.exits.len());
        for exit in raw.exits {
            check_walkable("exit", exit.cell)?;
            exits.push(ExitZone {
                cell: exit.cell,
                to: exit.to,
                arrive: exit.arrive,
            });
        }

        Ok(Self {
            name: raw.name.unwrap_or_else(|| raw.id.clone()),
            id: raw.id,
            tiles,
            spawn: raw.spawn,
            enemy_spawns: raw.enemy_spawns,
            weapons,
            exits,
        })
    }

    pub fn exit_at(&self, cell: GridIndex) -> Option<&ExitZone> {
        self.exits.iter().find(|exit| exit.cell == cell)
    }
}

#[derive(Clone, Debug, Default)]
pub struct MapRegistry {
    maps: Vec<GameMap>,
    lookup: HashMap<String, usize>,
}

impl MapRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The maps bundled with the game, already validated.
    pub fn builtin(tile_size: f32) -> Result<Self, MapLoadError> {
        let mut registry = Self::new();
        for raw in BUILTIN_MAPS {
            registry.insert(GameMap::from_yaml_str(raw, tile_size)?);
        }
        registry.validate()?;
        Ok(registry)
    }

    /// Loads every `.yaml`, `.yml` and `.json` map in `dir`.
    pub fn load_from(dir: impl AsRef<Path>, tile_size: f32) -> Result<Self, MapLoadError> {
        let dir = dir.as_ref();
        let mut registry = Self::new();
        if !dir.exists() {
            return Ok(registry);
        }

        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            paths.push(entry?.path());
        }
        paths.sort();

        for path in paths {
            let ext = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(str::to_ascii_lowercase);
            let map = match ext.as_deref() {
                Some("yaml") | Some("yml") => {
                    GameMap::from_yaml_str(&std::fs::read_to_string(&path)?, tile_size)?
                }
                Some("json") => GameMap::from_json_str(&std::fs::read_to_string(&path)?, tile_size)?,
                _ => continue,
            };
            registry.insert(map);
        }

        registry.validate()?;
        Ok(registry)
    }

    /// Adds or replaces a map by id.
    pub fn insert(&mut self, map: GameMap) {
        if let Some(&index) = self.lookup.get(&map.id) {
            self.maps[index] = map;
            return;
        }
        self.lookup.insert(map.id.clone(), self.maps.len());
        self.maps.push(map);
    }

    pub fn get(&self, id: &str) -> Option<&GameMap> {
        self.lookup.get(id).map(|&index| &self.maps[index])
    }

    pub fn first(&self) -> Option<&GameMap> {
        self.maps.first()
    }

    pub fn len(&self) -> usize {
        self.maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.maps.iter().map(|map| map.id.as_str())
    }

    /// Every exit must lead to a known map and land on a walkable cell.
    pub fn validate(&self) -> Result<(), MapLoadError> {
        for map in &self.maps {
            for exit in &map.exits {
                let Some(dest) = self.get(&exit.to) else {
                    return Err(MapLoadError::Invalid(format!(
                        "exit on '{}' leads to unknown map '{}'",
                        map.id, exit.to
                    )));
                };
                if !dest.tiles.is_walkable(exit.arrive) {
                    return Err(MapLoadError::Invalid(format!(
                        "exit on '{}' arrives at blocked cell ({}, {}) of '{}'",
                        map.id, exit.arrive.x, exit.arrive.y, dest.id
                    )));
                }
                if dest.exit_at(exit.arrive).is_some() {
                    return Err(MapLoadError::Invalid(format!(
                        "exit on '{}' arrives on exit cell ({}, {}) of '{}'",
                        map.id, exit.arrive.x, exit.arrive.y, dest.id
                    )));
                }
            }
        }
        Ok(())
    }
}

#[derive(Deserialize)]
struct MapFile {
    id: String,
    #[serde(default)]
    name: Option<String>,
    grid: Vec<Vec<u8>>,
    spawn: GridIndex,
    #[serde(default)]
    enemy_spawns: Vec<GridIndex>,
    #[serde(default)]
    weapons: Vec<WeaponTileFile>,
    #[serde(default)]
    exits: Vec<ExitFile>,
}

#[derive(Deserialize)]
struct WeaponTileFile {
    kind: Weapon,
    cell: GridIndex,
    #[serde(default)]
    key: Option<String>,
}

#[derive(Deserialize)]
struct ExitFile {
    cell: GridIndex,
    to: String,
    arrive: GridIndex,
}
