//! Periodic JSON snapshots of the world, one file per interval tick.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::world::{World, WorldSnapshot};

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to write snapshot: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to serialize snapshot: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Envelope written to disk. The wall-clock stamp is metadata only; the
/// simulation payload itself is deterministic.
#[derive(Debug, Serialize)]
struct SnapshotFile {
    written_at: String,
    #[serde(flatten)]
    snapshot: WorldSnapshot,
}

pub struct SnapshotWriter {
    dir: PathBuf,
    interval_ticks: u64,
}

impl SnapshotWriter {
    /// An interval of 0 disables snapshotting.
    pub fn new(dir: impl AsRef<Path>, interval_ticks: u64) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            interval_ticks,
        }
    }

    pub fn due(&self, tick: u64) -> bool {
        self.interval_ticks > 0 && tick > 0 && tick % self.interval_ticks == 0
    }

    /// Writes `dir/<scenario>/tick_NNNNNN.json` when the tick is due.
    pub fn maybe_write(&self, world: &World) -> Result<Option<PathBuf>, SnapshotError> {
        if !self.due(world.tick()) {
            return Ok(None);
        }
        let out_dir = self.dir.join(world.scenario());
        fs::create_dir_all(&out_dir)?;
        let path = out_dir.join(format!("tick_{:06}.json", world.tick()));
        let file = SnapshotFile {
            written_at: chrono::Local::now().to_rfc3339(),
            snapshot: world.snapshot(),
        };
        fs::write(&path, serde_json::to_vec_pretty(&file)?)?;
        Ok(Some(path))
    }
}
