use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::animation::AnimMeta;
use crate::player::{Ability, PlayerClass};

#[derive(Debug)]
pub enum ConfigLoadError {
    Io(std::io::Error),
    Yaml(serde_yaml::Error),
}

impl std::fmt::Display for ConfigLoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "io error: {err}"),
            Self::Yaml(err) => write!(f, "yaml error: {err}"),
        }
    }
}

impl std::error::Error for ConfigLoadError {}

impl From<std::io::Error> for ConfigLoadError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_yaml::Error> for ConfigLoadError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Yaml(err)
    }
}

/// Every tunable of the simulation. Built once and shared read-only.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub tile_size: f32,
    pub max_frame_dt: f32,
    pub player: PlayerTuning,
    pub classes: ClassTable,
    pub enemy: EnemyTuning,
    pub combat: CombatTuning,
    pub spawn: SpawnTuning,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tile_size: 32.0,
            max_frame_dt: 0.033,
            player: PlayerTuning::default(),
            classes: ClassTable::default(),
            enemy: EnemyTuning::default(),
            combat: CombatTuning::default(),
            spawn: SpawnTuning::default(),
        }
    }
}

impl SimConfig {
    pub fn from_yaml_str(raw: &str) -> Result<Self, ConfigLoadError> {
        Ok(serde_yaml::from_str(raw)?)
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigLoadError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&raw)
    }

    pub fn class(&self, class: PlayerClass) -> &ClassConfig {
        match class {
            PlayerClass::Warrior => &self.classes.warrior,
            PlayerClass::Rogue => &self.classes.rogue,
            PlayerClass::Wizard => &self.classes.wizard,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    pub width: f32,
    pub height: f32,
    pub invuln_ms: f64,
    pub frames: PlayerFrames,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            width: 16.0,
            height: 24.0,
            invuln_ms: 400.0,
            frames: PlayerFrames::default(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerFrames {
    pub idle: AnimMeta,
    pub run: AnimMeta,
    pub attack: AnimMeta,
    pub die: AnimMeta,
    pub sleep: AnimMeta,
    pub blink: AnimMeta,
}

impl Default for PlayerFrames {
    fn default() -> Self {
        Self {
            idle: AnimMeta::new(4, 6.0),
            run: AnimMeta::new(4, 10.0),
            attack: AnimMeta::new(6, 14.0),
            die: AnimMeta::new(4, 6.0),
            sleep: AnimMeta::new(6, 5.0),
            blink: AnimMeta::new(6, 14.0),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClassConfig {
    pub name: String,
    pub max_hp: i32,
    pub speed: f32,
    pub ability: Ability,
    pub ability_cooldown_ms: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(from = "ClassTableFile")]
pub struct ClassTable {
    pub warrior: ClassConfig,
    pub rogue: ClassConfig,
    pub wizard: ClassConfig,
}

const BASE_PLAYER_SPEED: f32 = 85.0;
const BASE_MAX_HP: i32 = 3;

impl Default for ClassTable {
    fn default() -> Self {
        Self {
            warrior: ClassConfig {
                name: "Warrior".to_owned(),
                max_hp: 5,
                speed: BASE_PLAYER_SPEED - 40.0,
                ability: Ability::Slam,
                ability_cooldown_ms: 1500.0,
            },
            rogue: ClassConfig {
                name: "Rogue".to_owned(),
                max_hp: BASE_MAX_HP,
                speed: BASE_PLAYER_SPEED * 1.5,
                ability: Ability::Trap,
                ability_cooldown_ms: 1500.0,
            },
            wizard: ClassConfig {
                name: "Wizard".to_owned(),
                max_hp: BASE_MAX_HP,
                speed: BASE_PLAYER_SPEED * 0.9,
                ability: Ability::Blink,
                ability_cooldown_ms: 1000.0,
            },
        }
    }
}

impl From<ClassTableFile> for ClassTable {
    fn from(file: ClassTableFile) -> Self {
        let roster = Self::default();
        Self {
            warrior: file.warrior.apply(roster.warrior),
            rogue: file.rogue.apply(roster.rogue),
            wizard: file.wizard.apply(roster.wizard),
        }
    }
}

/// Per-class overrides. Anything left out keeps the roster value.
#[derive(Default, Deserialize)]
#[serde(default)]
struct ClassTableFile {
    warrior: ClassFile,
    rogue: ClassFile,
    wizard: ClassFile,
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct ClassFile {
    name: Option<String>,
    max_hp: Option<i32>,
    speed: Option<f32>,
    ability: Option<Ability>,
    ability_cooldown_ms: Option<f64>,
}

impl ClassFile {
    fn apply(self, base: ClassConfig) -> ClassConfig {
        ClassConfig {
            name: self.name.unwrap_or(base.name),
            max_hp: self.max_hp.unwrap_or(base.max_hp),
            speed: self.speed.unwrap_or(base.speed),
            ability: self.ability.unwrap_or(base.ability),
            ability_cooldown_ms: self.ability_cooldown_ms.unwrap_or(base.ability_cooldown_ms),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyTuning {
    pub width: f32,
    pub height: f32,
    pub max_health: i32,
    pub speed: f32,
    pub attack_range: f32,
    pub attack_ms: f64,
    pub path_recompute_ms: f64,
    pub waypoint_tolerance: f32,
    pub frames: GoblinFrames,
}

impl Default for EnemyTuning {
    fn default() -> Self {
        Self {
            width: 16.0,
            height: 24.0,
            max_health: 3,
            speed: 45.0,
            attack_range: 22.0,
            attack_ms: 300.0,
            path_recompute_ms: 500.0,
            waypoint_tolerance: 2.0,
            frames: GoblinFrames::default(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct GoblinFrames {
    pub idle: AnimMeta,
    pub run: AnimMeta,
    pub attack: AnimMeta,
    pub die: AnimMeta,
}

impl Default for GoblinFrames {
    fn default() -> Self {
        Self {
            idle: AnimMeta::new(4, 6.0),
            run: AnimMeta::new(4, 10.0),
            attack: AnimMeta::new(6, 12.0),
            die: AnimMeta::new(4, 8.0),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatTuning {
    pub melee_damage: i32,
    pub melee_rehit_ms: f64,
    pub arrow: ArrowTuning,
    pub fireball: FireballTuning,
    pub blink: BlinkTuning,
    pub trap: TrapTuning,
    pub slam: SlamTuning,
}

impl Default for CombatTuning {
    fn default() -> Self {
        Self {
            melee_damage: 1,
            melee_rehit_ms: 200.0,
            arrow: ArrowTuning::default(),
            fireball: FireballTuning::default(),
            blink: BlinkTuning::default(),
            trap: TrapTuning::default(),
            slam: SlamTuning::default(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ArrowTuning {
    pub speed: f32,
    pub radius: f32,
    pub hit_damage: i32,
    pub dot_damage: i32,
    pub dot_ticks: u32,
    pub dot_interval_ms: f64,
}

impl Default for ArrowTuning {
    fn default() -> Self {
        Self {
            speed: 260.0,
            radius: 6.0,
            hit_damage: 1,
            dot_damage: 1,
            dot_ticks: 3,
            dot_interval_ms: 600.0,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct FireballTuning {
    pub speed: f32,
    pub radius: f32,
    pub aoe_radius_tiles: f32,
    pub aoe_damage: i32,
    pub explosion_ms: f64,
}

impl Default for FireballTuning {
    fn default() -> Self {
        Self {
            speed: 200.0,
            radius: 10.0,
            aoe_radius_tiles: 1.0,
            aoe_damage: 1,
            explosion_ms: 250.0,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct BlinkTuning {
    pub max_tiles: f32,
    pub step_tiles: f32,
}

impl Default for BlinkTuning {
    fn default() -> Self {
        Self {
            max_tiles: 3.0,
            step_tiles: 0.25,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TrapTuning {
    pub duration_ms: f64,
    pub stun_ms: f64,
}

impl Default for TrapTuning {
    fn default() -> Self {
        Self {
            duration_ms: 6000.0,
            stun_ms: 1000.0,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SlamTuning {
    pub radius_tiles: f32,
    pub knockback_tiles: f32,
    pub knockback_ms: f64,
    pub damage: i32,
}

impl Default for SlamTuning {
    fn default() -> Self {
        Self {
            radius_tiles: 2.5,
            knockback_tiles: 2.5,
            knockback_ms: 250.0,
            damage: 1,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnTuning {
    pub max_enemies: usize,
    pub enemy_interval_ms: f64,
    pub require_weapon_to_spawn: bool,
    pub max_hearts: usize,
    pub heart_interval_ms: f64,
    pub heart_jitter_ms: f64,
    pub heart_lifetime_ms: f64,
    pub heart_heal: i32,
    pub heart_size: f32,
}

impl Default for SpawnTuning {
    fn default() -> Self {
        Self {
            max_enemies: 3,
            enemy_interval_ms: 4000.0,
            require_weapon_to_spawn: false,
            max_hearts: 2,
            heart_interval_ms: 5000.0,
            heart_jitter_ms: 2000.0,
            heart_lifetime_ms: 12_000.0,
            heart_heal: 1,
            heart_size: 12.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_keeps_defaults() {
        let cfg = SimConfig::from_yaml_str("spawn:\n  max_enemies: 7\nenemy:\n  speed: 60.0\n").unwrap();
        assert_eq!(cfg.spawn.max_enemies, 7);
        assert_eq!(cfg.spawn.max_hearts, 2);
        assert_eq!(cfg.enemy.speed, 60.0);
        assert_eq!(cfg.enemy.max_health, 3);
        assert_eq!(cfg.tile_size, 32.0);
    }

    #[test]
    fn partial_class_override_keeps_the_roster() {
        let cfg = SimConfig::from_yaml_str("classes:\n  warrior:\n    speed: 60.0\n").unwrap();
        assert_eq!(cfg.classes.warrior.speed, 60.0);
        assert_eq!(cfg.classes.warrior.max_hp, 5);
        assert_eq!(cfg.classes.warrior.ability, Ability::Slam);
        assert_eq!(cfg.classes.warrior.name, "Warrior");
        assert_eq!(cfg.classes.rogue.ability, Ability::Trap);
        assert_eq!(cfg.classes.wizard.ability_cooldown_ms, 1000.0);
    }

    #[test]
    fn class_table_matches_roster() {
        let cfg = SimConfig::default();
        assert_eq!(cfg.class(PlayerClass::Warrior).max_hp, 5);
        assert_eq!(cfg.class(PlayerClass::Wizard).ability, Ability::Blink);
        assert_eq!(cfg.class(PlayerClass::Rogue).ability_cooldown_ms, 1500.0);
    }
}
