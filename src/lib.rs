pub mod animation;
pub mod collision;
pub mod combat;
pub mod config;
pub mod enemy;
pub mod frame;
pub mod input;
pub mod map;
pub mod nav;
pub mod player;
pub mod sim;
pub mod spawn;
pub mod world;

pub use config::SimConfig;
pub use input::{Action, ActionSet};
pub use map::{GameMap, GridIndex, MapRegistry};
pub use sim::{SimEvent, Simulation};
pub use world::{Hud, RunState, World};
