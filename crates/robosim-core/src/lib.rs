//! # Robosim Core
//!
//! Arena simulation and replay engine for robosim.
//!
//! Agents move through a bounded arena full of square obstacles. Autonomous
//! agents wander and turn away when blocked; controlled agents follow turn
//! and move intents. Every running tick is appended to a JSON replay log,
//! which can be scrubbed backward and forward and cut at any point to resume
//! live simulation from there.
//!
//! ## Architecture
//!
//! - [`arena`]: occupant storage, the one-occupant-per-cell rule and the
//!   stepping loops
//! - [`agent`]: the two agent variants and their movement rules, with
//!   legality in [`movement`]
//! - [`replay`]: the append-only frame log
//! - [`simulation`]: the controller tying arena, intents and log together
//! - [`map`]: arena descriptions and the map store
//!
//! ## Usage
//!
//! ```
//! use robosim_core::config::SimConfig;
//! use robosim_core::map::{ArenaDescription, ArenaSource, GridPoint};
//! use robosim_core::simulation::Simulation;
//! use robosim_core::slot::SlotKey;
//!
//! let mut layout = ArenaDescription::default();
//! layout.obstacles.insert(SlotKey::obstacle(0), GridPoint::new(5, 5));
//! layout.agents.insert(SlotKey::agent(0), GridPoint::new(1, 1));
//! let source = ArenaSource::new("demo", layout);
//!
//! let dir = tempfile::tempdir().unwrap();
//! let mut sim = Simulation::new(SimConfig::default().with_log_dir(dir.path()), &source);
//! sim.start(&source).unwrap();
//! for _ in 0..60 {
//!     sim.tick().unwrap();
//! }
//! assert_eq!(sim.log().unwrap().len(), 60);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub use robosim_geom as geom;

pub mod agent;
pub mod arena;
pub mod config;
pub mod entity;
pub mod error;
pub mod map;
pub mod movement;
pub mod replay;
pub mod simulation;
pub mod slot;

pub use agent::{Agent, AgentView, Angle, AutonomousAgent, ControlledAgent, TurnIntent};
pub use arena::Arena;
pub use config::SimConfig;
pub use entity::{EntityId, EntityKind};
pub use error::{ConfigError, LogError, MapError, SimError};
pub use map::{ArenaDescription, ArenaSource, MapStore};
pub use replay::{Direction, Frame, ReplayLog};
pub use simulation::{SimState, Simulation, TickReport};

#[cfg(test)]
mod tests;
