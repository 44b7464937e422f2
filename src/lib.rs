pub mod agent;
pub mod engine;
pub mod grid;
pub mod memory;
pub mod rng;
pub mod scenario;
pub mod snapshot;
pub mod systems;
pub mod web;
pub mod world;

pub use engine::{Engine, EngineBuilder, EngineSettings};
pub use scenario::{Scenario, ScenarioLoader};
pub use systems::UpdateMode;
