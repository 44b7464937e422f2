//! The lightweight update strategy: agents wander a little and cycle
//! through their routine labels, without memory or pathfinding.

use anyhow::Result;
use rand::Rng;

use crate::engine::{System, SystemContext};
use crate::grid::Point;
use crate::rng::SystemRng;
use crate::world::World;

/// Maximum positional jitter per axis per tick.
const JITTER: f64 = 20.0;
const ACTIVITY_SWAP_CHANCE: f64 = 0.3;
const ENERGY_DRAIN: f64 = 1.0;
/// The drift tick never exhausts an agent completely.
const ENERGY_FLOOR: f64 = 20.0;

pub struct DriftSystem;

impl DriftSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DriftSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for DriftSystem {
    fn name(&self) -> &str {
        "drift"
    }

    fn run(
        &mut self,
        _ctx: &SystemContext,
        world: &mut World,
        rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        let bounds = world.walk_bounds;
        for index in 0..world.agent_count() {
            let dx = (rng.gen::<f64>() - 0.5) * JITTER;
            let dy = (rng.gen::<f64>() - 0.5) * JITTER;
            let swap = rng.gen::<f64>() < ACTIVITY_SWAP_CHANCE;
            let routine_pick = rng.gen::<f64>();

            let agent = world.agent_mut(index);
            agent.position = bounds.clamp(Point::new(
                agent.position.x + dx,
                agent.position.y + dy,
            ));
            if swap && !agent.routine.is_empty() {
                let pick = (routine_pick * agent.routine.len() as f64) as usize;
                let pick = pick.min(agent.routine.len() - 1);
                agent.activity = agent.routine[pick].clone();
            }
            agent.energy = (agent.energy - ENERGY_DRAIN).max(ENERGY_FLOOR);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Agent;
    use crate::engine::SystemContext;
    use crate::rng::RngManager;

    fn town_with_agents() -> World {
        let mut world = World::new("drift_test", 800.0, 600.0, 20.0);
        for (id, name) in [("handyman-bob", "Bob"), ("farmer-joe", "Joe")] {
            world.spawn_agent(Agent::new(
                id,
                name,
                "farmer",
                "test",
                Point::new(400.0, 300.0),
                vec!["Water plants".to_string(), "Rest".to_string()],
            ));
        }
        world
    }

    #[test]
    fn drift_keeps_agents_in_bounds_and_energy_floored() {
        let mut world = town_with_agents();
        let mut manager = RngManager::new(5);
        let mut system = DriftSystem::new();

        for _ in 0..200 {
            let ctx = SystemContext {
                tick: world.tick(),
                now_min: world.now_min(),
                scenario_name: "drift_test",
            };
            let mut rng = manager.stream("drift");
            system.run(&ctx, &mut world, &mut rng).unwrap();
            world.advance_time();
        }

        for agent in world.agents() {
            assert!(agent.position.x >= 50.0 && agent.position.x <= 750.0);
            assert!(agent.position.y >= 150.0 && agent.position.y <= 500.0);
            assert_eq!(agent.energy, 20.0);
            assert!(agent.routine.contains(&agent.activity));
        }
    }
}
