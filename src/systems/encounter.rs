//! Proximity-driven observation and conversation between agents.
//!
//! Whenever two agents stand within sighting range, the observer records
//! the sighting; occasionally, if the observer still wants company, it
//! opens a short emoji greeting that both parties remember.

use anyhow::Result;
use rand::Rng;

use crate::agent::Agent;
use crate::engine::{System, SystemContext};
use crate::memory::MemoryKind;
use crate::rng::SystemRng;
use crate::world::{Message, World};

const SIGHT_RADIUS: f64 = 50.0;
const CONVERSATION_CHANCE: f64 = 0.1;
/// Agents above this social level do not start conversations.
const SOCIAL_OPEN_CEILING: f64 = 70.0;
const SOCIAL_BOOST: f64 = 5.0;

const GREETING_PAIRS: [[&str; 2]; 3] = [["👋", "😊"], ["🤝", "👍"], ["😊", "❓"]];

pub struct EncounterSystem;

impl EncounterSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for EncounterSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for EncounterSystem {
    fn name(&self) -> &str {
        "encounter"
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        let count = world.agent_count();
        let now = ctx.now_min;
        for observer in 0..count {
            for other in 0..count {
                if observer == other {
                    continue;
                }
                let here = world.agent(observer).position;
                let there = world.agent(other).position;
                if here.distance(there) >= SIGHT_RADIUS {
                    continue;
                }

                let other_name = world.agent(other).name.clone();
                world.agent_mut(observer).observe(&other_name, there, now);

                if rng.gen::<f64>() < CONVERSATION_CHANCE
                    && world.agent(observer).social < SOCIAL_OPEN_CEILING
                {
                    let pair = GREETING_PAIRS[rng.gen_range(0..GREETING_PAIRS.len())];
                    let stamp = world.clock.stamp();
                    let from = world.agent(observer).id.clone();
                    let to = world.agent(other).id.clone();
                    {
                        let (a, b) = world.agent_pair_mut(observer, other);
                        converse(a, b, pair, now);
                    }
                    world.push_message(Message {
                        from,
                        to,
                        emojis: [pair[0].to_string(), pair[1].to_string()],
                        intent: "greeting".to_string(),
                        timestamp: stamp,
                    });
                }
            }
        }
        Ok(())
    }
}

/// Runs one greeting between `initiator` and `partner`: both record a
/// matching conversation memory and the initiator's social need rises by
/// five, capped at 100.
pub(crate) fn converse(initiator: &mut Agent, partner: &mut Agent, pair: [&str; 2], now_min: f64) {
    initiator.record(
        format!(
            "I greeted {} with {} {}",
            partner.name, pair[0], pair[1]
        ),
        MemoryKind::Conversation,
        5,
        vec![partner.name.clone()],
        now_min,
    );
    partner.record(
        format!(
            "{} greeted me with {} {}",
            initiator.name, pair[0], pair[1]
        ),
        MemoryKind::Conversation,
        5,
        vec![initiator.name.clone()],
        now_min,
    );
    initiator.social = (initiator.social + SOCIAL_BOOST).min(100.0);
}
