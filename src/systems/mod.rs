//! Tick systems. Two named update strategies share this roster:
//! [`UpdateMode::Drift`] runs the lightweight jitter tick, while
//! [`UpdateMode::Cognitive`] runs the full per-agent cognition loop.
//! Both include the ambient chatter system.

mod chatter;
mod cognition;
mod drift;
mod encounter;

pub use chatter::ChatterSystem;
pub use cognition::CognitionSystem;
pub use drift::DriftSystem;
pub use encounter::EncounterSystem;

use serde::Deserialize;

/// Which per-tick update strategy a run uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum UpdateMode {
    /// Positional jitter plus routine-label activity swaps.
    Drift,
    /// Memory, planning, pathfinding, and proximity encounters.
    Cognitive,
}
