//! The full update strategy: every agent runs its cognition loop once per
//! tick. A fault in one agent is logged and skipped so the rest of the
//! population still updates.

use anyhow::Result;
use tracing::warn;

use crate::engine::{System, SystemContext};
use crate::rng::SystemRng;
use crate::world::World;

pub struct CognitionSystem;

impl CognitionSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CognitionSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for CognitionSystem {
    fn name(&self) -> &str {
        "cognition"
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        let bounds = world.walk_bounds;
        let now = ctx.now_min;
        let (grid, agents) = world.nav_and_agents();
        for agent in agents.iter_mut() {
            if let Err(err) = agent.update(grid, &bounds, rng, now) {
                warn!(agent = %agent.id, error = %err, "agent update failed, skipping this tick");
            }
        }
        Ok(())
    }
}
