//! Tick engine: runs the configured systems in order, advances the
//! calendar, and emits snapshots.

use std::path::PathBuf;

use anyhow::Result;

use crate::rng::{RngManager, SystemRng};
use crate::snapshot::SnapshotWriter;
use crate::systems::{self, UpdateMode};
use crate::world::{World, WorldSnapshot};

pub struct EngineSettings {
    pub scenario_name: String,
    pub seed: u64,
    pub snapshot_interval_ticks: u64,
    pub snapshot_dir: PathBuf,
}

pub struct EngineBuilder {
    settings: EngineSettings,
    systems: Vec<Box<dyn System + Send>>,
}

impl EngineBuilder {
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            settings,
            systems: Vec::new(),
        }
    }

    pub fn with_system(mut self, system: impl System + Send + 'static) -> Self {
        self.systems.push(Box::new(system));
        self
    }

    /// Installs the system set for one of the two named update strategies.
    pub fn with_mode(self, mode: UpdateMode) -> Self {
        match mode {
            UpdateMode::Drift => self
                .with_system(systems::DriftSystem::new())
                .with_system(systems::ChatterSystem::new()),
            UpdateMode::Cognitive => self
                .with_system(systems::CognitionSystem::new())
                .with_system(systems::EncounterSystem::new())
                .with_system(systems::ChatterSystem::new()),
        }
    }

    pub fn build(self) -> Engine {
        Engine {
            rng: RngManager::new(self.settings.seed),
            systems: self.systems,
            snapshot_writer: SnapshotWriter::new(
                &self.settings.snapshot_dir,
                self.settings.snapshot_interval_ticks,
            ),
            settings: self.settings,
        }
    }
}

pub struct Engine {
    rng: RngManager,
    systems: Vec<Box<dyn System + Send>>,
    snapshot_writer: SnapshotWriter,
    settings: EngineSettings,
}

impl Engine {
    pub fn run(&mut self, world: &mut World, ticks: u64) -> Result<()> {
        self.run_with_hook(world, ticks, |_| {})
    }

    /// Runs `ticks` ticks, handing the post-tick snapshot to `hook`.
    pub fn run_with_hook(
        &mut self,
        world: &mut World,
        ticks: u64,
        mut hook: impl FnMut(WorldSnapshot),
    ) -> Result<()> {
        for _ in 0..ticks {
            let snapshot = self.step(world)?;
            hook(snapshot);
        }
        Ok(())
    }

    /// Advances the simulation by exactly one tick and returns the fresh
    /// snapshot. The web driver calls this on its own cadence.
    pub fn step(&mut self, world: &mut World) -> Result<WorldSnapshot> {
        let current_tick = world.tick();
        for system in &mut self.systems {
            let ctx = SystemContext {
                tick: current_tick,
                now_min: world.now_min(),
                scenario_name: &self.settings.scenario_name,
            };
            let mut stream = self.rng.stream(system.name());
            system.run(&ctx, world, &mut stream)?;
        }
        world.advance_time();
        self.snapshot_writer.maybe_write(world)?;
        Ok(world.snapshot())
    }

    pub fn scenario_name(&self) -> &str {
        &self.settings.scenario_name
    }
}

pub struct SystemContext<'a> {
    pub tick: u64,
    /// Simulated minutes elapsed at the start of this tick.
    pub now_min: f64,
    pub scenario_name: &'a str,
}

pub trait System {
    fn name(&self) -> &str;
    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        rng: &mut SystemRng<'_>,
    ) -> Result<()>;
}
