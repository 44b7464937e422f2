//! Background emoji chatter between random pairs of agents.
//!
//! Independent of proximity: any two townspeople may trade a quick
//! emoji exchange over the town's message log, keeping the feed alive
//! even when nobody is actively conversing.

use anyhow::Result;
use rand::Rng;

use crate::engine::{System, SystemContext};
use crate::rng::SystemRng;
use crate::world::{Message, World};

const CHATTER_CHANCE: f64 = 0.2;

const CHATTER_PAIRS: [[&str; 2]; 8] = [
    ["👋", "😊"],
    ["🔨", "❓"],
    ["✅", "👍"],
    ["🌾", "🍞"],
    ["💊", "❤️"],
    ["📋", "⭐"],
    ["🛠️", "🔧"],
    ["🙏", "😊"],
];

pub struct ChatterSystem;

impl ChatterSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ChatterSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for ChatterSystem {
    fn name(&self) -> &str {
        "chatter"
    }

    fn run(
        &mut self,
        _ctx: &SystemContext,
        world: &mut World,
        rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        let count = world.agent_count();
        if count < 2 || rng.gen::<f64>() >= CHATTER_CHANCE {
            return Ok(());
        }

        let from = rng.gen_range(0..count);
        let mut to = rng.gen_range(0..count - 1);
        if to >= from {
            to += 1;
        }
        let pair = CHATTER_PAIRS[rng.gen_range(0..CHATTER_PAIRS.len())];

        let message = Message {
            from: world.agent(from).id.clone(),
            to: world.agent(to).id.clone(),
            emojis: [pair[0].to_string(), pair[1].to_string()],
            intent: "communication".to_string(),
            timestamp: world.clock.stamp(),
        };
        world.push_message(message);
        Ok(())
    }
}
