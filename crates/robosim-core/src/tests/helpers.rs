//! Test helper functions for building arenas and simulations.

use std::fs;
use std::path::Path;

use tempfile::TempDir;

use crate::config::SimConfig;
use crate::map::{ArenaDescription, ArenaSource, GridPoint};
use crate::replay::Frame;
use crate::simulation::Simulation;
use crate::slot::SlotKey;

// =============================================================================
// Layouts
// =============================================================================

/// A wall with three wanderers in front of it and one controlled agent
/// behind it.
///
/// The wall runs down grid column 8 from row 0 to row 11. The wanderers
/// start west of it facing east, so each of them runs into it within a few
/// hundred ticks and has to retarget.
pub fn corridor() -> ArenaSource {
    let mut d = ArenaDescription::default();
    for (i, row) in (0u32..12).zip(0i64..) {
        d.obstacles.insert(SlotKey::obstacle(i), GridPoint::new(8, row));
    }
    for (i, (x, y)) in (0u32..).zip([(1, 1), (3, 5), (2, 9)]) {
        d.agents.insert(SlotKey::agent(i), GridPoint::new(x, y));
    }
    d.controlled_agents
        .insert(SlotKey::agent(0), GridPoint::new(15, 10));
    ArenaSource::new("corridor", d)
}

/// A single controlled agent in the middle of an empty arena.
pub fn lone_controlled() -> ArenaSource {
    let mut d = ArenaDescription::default();
    d.controlled_agents
        .insert(SlotKey::agent(0), GridPoint::new(10, 10));
    ArenaSource::new("lone", d)
}

// =============================================================================
// Simulations
// =============================================================================

/// A simulation recording into `dir` with the given seed.
pub fn simulation(dir: &TempDir, seed: u64, source: &ArenaSource) -> Simulation {
    let config = SimConfig::default()
        .with_seed(seed)
        .with_log_dir(dir.path().join("logs"))
        .with_map_dir(dir.path().join("maps"));
    Simulation::new(config, source)
}

/// Starts `sim` and runs `ticks` recorded ticks.
pub fn run_ticks(sim: &mut Simulation, source: &ArenaSource, ticks: usize) {
    sim.start(source).unwrap();
    for _ in 0..ticks {
        sim.tick().unwrap();
    }
}

/// Parses a log file straight from disk.
pub fn read_log(path: &Path) -> Vec<Frame> {
    let content = fs::read_to_string(path).unwrap();
    serde_json::from_str(&content).unwrap()
}

/// Ids of the frames in a log file.
pub fn logged_ids(path: &Path) -> Vec<u64> {
    read_log(path).iter().map(|f| f.id).collect()
}
