//! YAML scenario files: town layout, roster, and run settings.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::agent::Agent;
use crate::grid::{Point, Rect};
use crate::systems::UpdateMode;
use crate::world::World;

fn default_mode() -> UpdateMode {
    UpdateMode::Cognitive
}

fn default_snapshot_interval_ticks() -> u64 {
    30
}

fn default_tick_interval_ms() -> u64 {
    2000
}

fn default_cell_size() -> f64 {
    20.0
}

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub description: Option<String>,
    pub seed: u64,
    #[serde(default = "default_mode")]
    pub mode: UpdateMode,
    #[serde(default)]
    pub ticks: Option<u64>,
    #[serde(default = "default_snapshot_interval_ticks")]
    pub snapshot_interval_ticks: u64,
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    pub map: MapConfig,
    #[serde(default)]
    pub water: Vec<RectConfig>,
    #[serde(default)]
    pub buildings: Vec<BuildingConfig>,
    pub agents: Vec<AgentConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MapConfig {
    pub width: f64,
    pub height: f64,
    #[serde(default = "default_cell_size")]
    pub cell_size: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RectConfig {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl RectConfig {
    fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BuildingConfig {
    pub id: String,
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub kind: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    pub id: String,
    pub name: String,
    pub role: String,
    pub description: String,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub routine: Vec<String>,
}

pub struct ScenarioLoader {
    base_dir: PathBuf,
}

impl ScenarioLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<Scenario> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
        let scenario: Scenario = serde_yaml::from_str(&data)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(scenario)
    }
}

impl Scenario {
    pub fn build_world(&self) -> World {
        let mut world = World::new(
            self.name.clone(),
            self.map.width,
            self.map.height,
            self.map.cell_size,
        );
        let buildings: Vec<Rect> = self
            .buildings
            .iter()
            .map(|b| Rect::new(b.x, b.y, b.width, b.height))
            .collect();
        let water: Vec<Rect> = self.water.iter().map(RectConfig::rect).collect();
        world.set_obstacles(&buildings, &water);
        for agent in &self.agents {
            world.spawn_agent(Agent::new(
                &agent.id,
                &agent.name,
                &agent.role,
                &agent.description,
                Point::new(agent.x, agent.y),
                agent.routine.clone(),
            ));
        }
        world
    }

    pub fn ticks(&self, override_ticks: Option<u64>) -> u64 {
        override_ticks.or(self.ticks).unwrap_or(120)
    }
}
