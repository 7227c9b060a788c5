use log::{info, warn};
use rand::rngs::StdRng;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::config::SimConfig;
use crate::input::{Action, ActionSet};
use crate::map::{GridIndex, MapLoadError, MapRegistry};
use crate::player::{PlayerClass, Weapon};
use crate::sim::{SimEvent, Simulation};

#[derive(Debug)]
pub enum WorldError {
    NoMaps,
    UnknownMap(String),
    Invalid(MapLoadError),
}

impl std::fmt::Display for WorldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoMaps => write!(f, "map registry is empty"),
            Self::UnknownMap(id) => write!(f, "unknown map '{id}'"),
            Self::Invalid(err) => write!(f, "map registry rejected: {err}"),
        }
    }
}

impl std::error::Error for WorldError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Invalid(err) => Some(err),
            _ => None,
        }
    }
}

impl From<MapLoadError> for WorldError {
    fn from(err: MapLoadError) -> Self {
        Self::Invalid(err)
    }
}

/// Everything about the current run that outlives a single map.
#[derive(Clone, Debug, PartialEq)]
pub struct RunState {
    pub class: PlayerClass,
    pub health: i32,
    pub weapon: Option<Weapon>,
    /// Weapon keys already taken, per map id.
    pub collected: HashMap<String, HashSet<String>>,
    pub kills: u32,
    pub elapsed_ms: f64,
}

impl RunState {
    pub fn new(class: PlayerClass, config: &SimConfig) -> Self {
        Self {
            class,
            health: config.class(class).max_hp,
            weapon: None,
            collected: HashMap::new(),
            kills: 0,
            elapsed_ms: 0.0,
        }
    }

    pub fn is_collected(&self, map_id: &str, key: &str) -> bool {
        self.collected
            .get(map_id)
            .is_some_and(|keys| keys.contains(key))
    }

    /// Returns false if the key was already recorded.
    pub fn mark_collected(&mut self, map_id: &str, key: &str) -> bool {
        self.collected
            .entry(map_id.to_owned())
            .or_default()
            .insert(key.to_owned())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MapTransition {
    pub to_map: String,
    pub arrive: GridIndex,
}

/// Read-only snapshot for the overlay.
#[derive(Clone, Debug, PartialEq)]
pub struct Hud {
    pub class: String,
    pub map: String,
    pub health: i32,
    pub max_health: i32,
    pub weapon: Option<Weapon>,
    pub kills: u32,
    pub elapsed_ms: f64,
    pub game_over: bool,
}

/// Owns the map registry and the live simulation, and carries the run
/// across map transitions and restarts.
pub struct World {
    config: Rc<SimConfig>,
    maps: MapRegistry,
    start_map: String,
    class: PlayerClass,
    sim: Simulation,
    rng: StdRng,
    restart_held: bool,
}

impl World {
    /// Starts a fresh run on the first map of the registry.
    pub fn new(
        config: Rc<SimConfig>,
        maps: MapRegistry,
        class: PlayerClass,
        rng: StdRng,
    ) -> Result<Self, WorldError> {
        maps.validate()?;
        let start = maps.first().ok_or(WorldError::NoMaps)?;
        let start_map = start.id.clone();
        let run = RunState::new(class, &config);
        let sim = Simulation::new(Rc::clone(&config), start.clone(), run, None);
        info!("new run as {} on '{}'", config.class(class).name, start_map);
        Ok(Self {
            config,
            maps,
            start_map,
            class,
            sim,
            rng,
            restart_held: false,
        })
    }

    /// Like `new`, but starting on a named map.
    pub fn starting_on(
        config: Rc<SimConfig>,
        maps: MapRegistry,
        start_map: &str,
        class: PlayerClass,
        rng: StdRng,
    ) -> Result<Self, WorldError> {
        if maps.get(start_map).is_none() {
            return Err(WorldError::UnknownMap(start_map.to_owned()));
        }
        let mut world = Self::new(config, maps, class, rng)?;
        world.start_map = start_map.to_owned();
        world.restart();
        Ok(world)
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn maps(&self) -> &MapRegistry {
        &self.maps
    }

    pub fn class(&self) -> PlayerClass {
        self.class
    }

    pub fn simulation(&self) -> &Simulation {
        &self.sim
    }

    pub fn simulation_mut(&mut self) -> &mut Simulation {
        &mut self.sim
    }

    pub fn hud(&self) -> Hud {
        self.sim.hud()
    }

    /// Throws the run away and starts over on the first map.
    pub fn restart(&mut self) {
        let Some(start) = self.maps.get(&self.start_map) else {
            warn!("start map '{}' vanished, keeping current run", self.start_map);
            return;
        };
        let run = RunState::new(self.class, &self.config);
        self.sim = Simulation::new(Rc::clone(&self.config), start.clone(), run, None);
        info!("run restarted as {}", self.config.class(self.class).name);
    }

    pub fn select_class(&mut self, class: PlayerClass) {
        self.class = class;
        self.restart();
    }

    /// Advances one frame. Restart fires on the press, not while held.
    /// A map exit is handled here and still reported to the caller.
    pub fn step(&mut self, dt: f32, actions: &ActionSet) -> Option<SimEvent> {
        let restart = actions.contains(Action::Restart);
        let pressed = restart && !self.restart_held;
        self.restart_held = restart;
        if pressed {
            self.restart();
            return None;
        }

        let event = self.sim.update(dt, actions, &mut self.rng);
        if let Some(SimEvent::MapExit(transition)) = &event {
            if !self.enter(transition) {
                self.sim.resume();
                return None;
            }
        }
        event
    }

    fn enter(&mut self, transition: &MapTransition) -> bool {
        let Some(dest) = self.maps.get(&transition.to_map) else {
            warn!("exit leads to unknown map '{}'", transition.to_map);
            return false;
        };
        let run = self.sim.run_state().clone();
        info!(
            "entering '{}' at ({}, {})",
            dest.id, transition.arrive.x, transition.arrive.y
        );
        self.sim = Simulation::new(
            Rc::clone(&self.config),
            dest.clone(),
            run,
            Some(transition.arrive),
        );
        true
    }
}
