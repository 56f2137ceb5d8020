//! Simulation controller: tick execution, mode transitions and replay.
//!
//! The `Simulation` owns one arena, one replay log and the RNG used for
//! autonomous retargeting. It is driven from outside: a caller sets control
//! intents and calls [`Simulation::tick`] at whatever rate it likes
//! ([`SimConfig::tick_rate_hz`] is the suggested cap).
//!
//! # States
//!
//! ```text
//!  FirstRun --start--> Running <--start/stop--> Stopped
//!                        |  ^                     |
//!           begin_replay |  | start               | begin_replay
//!                        v  |                     v
//!                    Replaying --end_replay--> AfterReplay
//! ```
//!
//! `restart` returns to `FirstRun` from anywhere. While running, every tick
//! steps the agents and appends a frame. While replaying, ticks move a
//! cursor through the recorded frames and restore each one into the arena.
//! Ending a replay discards the frames at and after the cursor, so live
//! simulation continues from the scrubbed point.
//!
//! # Determinism
//!
//! Retargeting draws from a `ChaCha8Rng` seeded from the config when the
//! simulation first starts. Two simulations with the same seed, arena and
//! intents record identical logs.
//!
//! # Example
//!
//! ```
//! use robosim_core::config::SimConfig;
//! use robosim_core::map::ArenaSource;
//! use robosim_core::simulation::{SimState, Simulation, TickReport};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let config = SimConfig::default().with_log_dir(dir.path());
//! let source = ArenaSource::empty();
//!
//! let mut sim = Simulation::new(config, &source);
//! sim.start(&source).unwrap();
//! assert_eq!(sim.tick().unwrap(), TickReport::Recorded { frame: 0 });
//!
//! sim.stop().unwrap();
//! assert_eq!(sim.state(), SimState::Stopped);
//! assert_eq!(sim.tick().unwrap(), TickReport::Idle);
//! ```

use std::fmt;
use std::path::PathBuf;

use chrono::Local;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use robosim_geom::Position;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::agent::{Agent, AgentView, AutonomousAgent, ControlledAgent, TurnIntent};
use crate::arena::Arena;
use crate::config::SimConfig;
use crate::error::SimError;
use crate::map::{ArenaDescription, ArenaSource, MapStore};
use crate::replay::{AgentRecord, Direction, Frame, ReplayLog, Snapshot};

// =============================================================================
// State
// =============================================================================

/// Controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SimState {
    /// Arena loaded, nothing recorded yet.
    FirstRun,
    /// Paused live simulation.
    Stopped,
    /// Live simulation; every tick is recorded.
    Running,
    /// Scrubbing through the log.
    Replaying,
    /// Paused after a replay; the log has been cut at the replay cursor.
    AfterReplay,
}

impl fmt::Display for SimState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::FirstRun => "first run",
            Self::Stopped => "stopped",
            Self::Running => "running",
            Self::Replaying => "replaying",
            Self::AfterReplay => "after replay",
        };
        f.write_str(name)
    }
}

/// What a call to [`Simulation::tick`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TickReport {
    /// Nothing; the simulation is not running or replaying.
    Idle,
    /// Agents stepped and the result was recorded under `frame`.
    Recorded {
        /// Id of the appended frame.
        frame: u64,
    },
    /// The cursor moved and `frame` was restored into the arena.
    Scrubbed {
        /// Id of the restored frame.
        frame: u64,
    },
    /// Replaying, but the cursor stayed at `cursor`: no scrub direction is
    /// selected or the log ends there.
    Held {
        /// Current cursor.
        cursor: u64,
    },
}

// =============================================================================
// Simulation
// =============================================================================

/// The simulation controller.
pub struct Simulation {
    config: SimConfig,
    /// Name of the loaded arena, used for log file names.
    arena_name: String,
    arena: Arena,
    state: SimState,
    log: Option<ReplayLog>,
    /// Id of the frame currently shown while replaying.
    cursor: u64,
    scrub: Option<Direction>,
    turn: TurnIntent,
    move_intent: bool,
    rng: ChaCha8Rng,
}

impl fmt::Debug for Simulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulation")
            .field("arena_name", &self.arena_name)
            .field("state", &self.state)
            .field("occupants", &self.arena.occupant_count())
            .field("log", &self.log.as_ref().map(ReplayLog::path))
            .field("cursor", &self.cursor)
            .field("seed", &self.config.seed)
            .finish_non_exhaustive()
    }
}

impl Simulation {
    /// Creates a controller in [`SimState::FirstRun`] with the arena built
    /// from `source`.
    #[must_use]
    pub fn new(config: SimConfig, source: &ArenaSource) -> Self {
        let arena = build(&config, &source.description);
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Self {
            config,
            arena_name: source.name.clone(),
            arena,
            state: SimState::FirstRun,
            log: None,
            cursor: 0,
            scrub: None,
            turn: TurnIntent::None,
            move_intent: false,
            rng,
        }
    }

    fn invalid(&self, action: &'static str) -> SimError {
        SimError::InvalidTransition {
            state: self.state,
            action,
        }
    }

    fn set_state(&mut self, state: SimState) {
        if state != self.state {
            debug!(from = %self.state, to = %state, "state change");
            self.state = state;
        }
    }

    /// Starts or resumes live simulation.
    ///
    /// From [`SimState::FirstRun`] the arena is rebuilt from `source`, the
    /// RNG is reseeded and a new replay log is created. From `Stopped` or
    /// `AfterReplay` recording resumes on the existing log. `source` is
    /// ignored in those states. Starting while running is a no-op.
    ///
    /// # Errors
    ///
    /// [`SimError::InvalidTransition`] while replaying and
    /// [`SimError::Log`] if the log cannot be created. On error the state is
    /// unchanged.
    pub fn start(&mut self, source: &ArenaSource) -> Result<(), SimError> {
        match self.state {
            SimState::FirstRun => {
                let log = ReplayLog::create(&self.config.log_dir, &source.name, &Local::now())?;
                info!(arena = %source.name, log = %log.path().display(), "simulation started");
                self.arena = build(&self.config, &source.description);
                self.arena_name.clone_from(&source.name);
                self.rng = ChaCha8Rng::seed_from_u64(self.config.seed);
                self.log = Some(log);
                self.set_state(SimState::Running);
            }
            SimState::Stopped | SimState::AfterReplay => self.set_state(SimState::Running),
            SimState::Running => {}
            SimState::Replaying => return Err(self.invalid("start")),
        }
        Ok(())
    }

    /// Pauses live simulation and flushes the log.
    ///
    /// A no-op unless running.
    ///
    /// # Errors
    ///
    /// [`SimError::InvalidTransition`] while replaying. [`SimError::Log`] if
    /// the flush fails; the simulation is stopped regardless.
    pub fn stop(&mut self) -> Result<(), SimError> {
        match self.state {
            SimState::Running => {
                self.set_state(SimState::Stopped);
                if let Some(log) = &mut self.log {
                    log.sync()?;
                }
                Ok(())
            }
            SimState::Replaying => Err(self.invalid("stop")),
            SimState::FirstRun | SimState::Stopped | SimState::AfterReplay => Ok(()),
        }
    }

    /// Discards the session and reloads the arena from `source`.
    ///
    /// Intents are cleared and the log handle is dropped; the log file
    /// itself stays on disk. The next [`start`](Self::start) records into a
    /// new log.
    pub fn restart(&mut self, source: &ArenaSource) {
        self.arena = build(&self.config, &source.description);
        self.arena_name.clone_from(&source.name);
        self.log = None;
        self.cursor = 0;
        self.scrub = None;
        self.turn = TurnIntent::None;
        self.move_intent = false;
        self.set_state(SimState::FirstRun);
        info!(arena = %source.name, "simulation restarted");
    }

    /// Enters replay with the cursor on the last recorded frame.
    ///
    /// Nothing has been recorded in [`SimState::FirstRun`], so the call is a
    /// no-op there, as it is when already replaying.
    pub fn begin_replay(&mut self) {
        if matches!(self.state, SimState::FirstRun | SimState::Replaying) {
            return;
        }
        let Some(log) = &mut self.log else {
            return;
        };
        log.begin_scrubbing();
        self.cursor = log.last_id().unwrap_or(0);
        self.scrub = None;
        info!(cursor = self.cursor, frames = log.len(), "replay started");
        self.set_state(SimState::Replaying);
    }

    /// Leaves replay, discarding every frame at or after the cursor.
    ///
    /// # Errors
    ///
    /// [`SimError::InvalidTransition`] unless replaying and
    /// [`SimError::Log`] if the log cannot be rewritten, in which case the
    /// simulation stays in replay.
    pub fn end_replay(&mut self) -> Result<(), SimError> {
        if self.state != SimState::Replaying {
            return Err(self.invalid("end replay"));
        }
        if let Some(log) = &mut self.log {
            log.truncate_from(self.cursor)?;
        }
        self.scrub = None;
        self.set_state(SimState::AfterReplay);
        Ok(())
    }

    /// Advances the simulation by one tick.
    ///
    /// # Errors
    ///
    /// While running, a failed append stops the simulation and returns
    /// [`SimError::Log`]; the arena keeps the state it reached this tick.
    /// While replaying, [`SimError::Log`] if the log cannot be loaded.
    pub fn tick(&mut self) -> Result<TickReport, SimError> {
        match self.state {
            SimState::Running => self.tick_live(),
            SimState::Replaying => self.tick_replay(),
            SimState::FirstRun | SimState::Stopped | SimState::AfterReplay => Ok(TickReport::Idle),
        }
    }

    fn tick_live(&mut self) -> Result<TickReport, SimError> {
        self.arena.step_autonomous(&mut self.rng);
        self.arena
            .step_controlled(self.turn, self.move_intent, &mut self.rng);

        let Some(log) = &mut self.log else {
            return Ok(TickReport::Idle);
        };
        match log.append(&capture(&self.arena)) {
            Ok(frame) => Ok(TickReport::Recorded { frame }),
            Err(err) => {
                warn!(error = %err, "recording failed, stopping simulation");
                self.set_state(SimState::Stopped);
                Err(err.into())
            }
        }
    }

    fn tick_replay(&mut self) -> Result<TickReport, SimError> {
        let held = TickReport::Held {
            cursor: self.cursor,
        };
        let (Some(direction), Some(log)) = (self.scrub, &mut self.log) else {
            return Ok(held);
        };
        match log.step(self.cursor, direction)? {
            Some(frame) => {
                restore(&mut self.arena, frame);
                self.cursor = frame.id;
                Ok(TickReport::Scrubbed { frame: frame.id })
            }
            None => Ok(held),
        }
    }

    /// Sets the turn input applied to controlled agents on every running
    /// tick until changed.
    pub fn set_turn_intent(&mut self, turn: TurnIntent) {
        self.turn = turn;
    }

    /// Sets whether controlled agents try to move on running ticks.
    pub fn set_move_intent(&mut self, move_intent: bool) {
        self.move_intent = move_intent;
    }

    /// Selects the direction replay ticks move the cursor; `None` holds.
    pub fn set_scrub_direction(&mut self, direction: Option<Direction>) {
        self.scrub = direction;
    }

    /// Every agent's kind, position and rendered heading, autonomous agents
    /// first.
    #[must_use]
    pub fn current_agent_states(&self) -> Vec<AgentView> {
        self.arena
            .autonomous()
            .iter()
            .map(Agent::view)
            .chain(self.arena.controlled().iter().map(Agent::view))
            .collect()
    }

    /// Saves the current layout to `store` as `name`.
    ///
    /// # Errors
    ///
    /// [`SimError::Map`] if the map cannot be written.
    pub fn save_arena(&self, store: &MapStore, name: &str) -> Result<PathBuf, SimError> {
        let description = ArenaDescription::from_arena(&self.arena, self.config.grid_scale);
        Ok(store.save(name, &description)?)
    }

    /// The arena.
    #[must_use]
    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    /// Name of the loaded arena.
    #[must_use]
    pub fn arena_name(&self) -> &str {
        &self.arena_name
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> SimState {
        self.state
    }

    /// The replay log, once the simulation has been started.
    #[must_use]
    pub fn log(&self) -> Option<&ReplayLog> {
        self.log.as_ref()
    }

    /// Replay cursor.
    #[must_use]
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    /// Configuration.
    #[must_use]
    pub fn config(&self) -> &SimConfig {
        &self.config
    }
}

fn build(config: &SimConfig, description: &ArenaDescription) -> Arena {
    description.build_arena(config.bounds, config.grid_scale)
}

fn record<A: Agent>(agent: &A) -> AgentRecord {
    let position = agent.position();
    AgentRecord {
        x: position.x,
        y: position.y,
        angle: agent.angle(),
    }
}

/// Captures every agent's position and rendered heading.
#[must_use]
pub fn capture(arena: &Arena) -> Snapshot {
    Snapshot {
        agents: arena.autonomous().iter().map(record).collect(),
        controlled_agents: arena.controlled().iter().map(record).collect(),
    }
}

/// Replaces the arena's agents with those recorded in `frame`.
///
/// Autonomous agents come back with target and rendered heading both set to
/// the recorded angle, so a resumed simulation starts them moving straight.
pub fn restore(arena: &mut Arena, frame: &Frame) {
    let at = |r: &AgentRecord| Position::new(r.x, r.y);
    let autonomous = frame
        .agents
        .values()
        .map(|r| AutonomousAgent::with_heading(at(r), r.angle))
        .collect();
    let controlled = frame
        .controlled_agents
        .values()
        .map(|r| ControlledAgent::with_heading(at(r), r.angle))
        .collect();
    arena.restore_agents(autonomous, controlled);
}

// =============================================================================
// Tests
// =============================================================================
