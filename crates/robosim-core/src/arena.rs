//! Arena module for the robot simulation.
//!
//! The Arena is the container for everything placed in a simulation. It
//! provides:
//! - Insertion-ordered storage for obstacles, autonomous agents and
//!   controlled agents
//! - The single-occupant-per-cell rule, checked at insertion time
//! - Identity assignment for every occupant
//! - The per-tick stepping loops for both agent collections
//!
//! # Occupancy
//!
//! Placement happens on a discrete grid even though agents later move
//! continuously between cells. Occupancy is therefore an exact coordinate
//! comparison, not a radius test: an insertion is rejected when any obstacle
//! or agent stands at exactly the same position. Rejection is an ordinary
//! `None` result, not an error.
//!
//! # Stepping
//!
//! Agents are stepped one at a time in insertion order. Each agent plans its
//! move against the arena as left by the agents before it, and the outcome is
//! applied before the next agent plans. No two agent updates interleave.
//!
//! # Example
//!
//! ```
//! use robosim_core::arena::Arena;
//! use robosim_core::agent::AutonomousAgent;
//! use robosim_geom::Position;
//!
//! let mut arena = Arena::new();
//!
//! let wall = arena.add_obstacle(Position::new(30.0, 0.0));
//! assert!(wall.is_some());
//!
//! // The cell is taken, so the agent is rejected.
//! assert!(arena.add_autonomous(AutonomousAgent::new(Position::new(30.0, 0.0))).is_none());
//! assert!(arena.add_autonomous(AutonomousAgent::new(Position::new(60.0, 0.0))).is_some());
//! ```

use rand::RngCore;
use robosim_geom::{Bounds, Position};
use tracing::debug;

use crate::agent::{
    Agent, AutonomousAgent, ControlledAgent, StepContext, StepOutcome, TurnIntent,
};
use crate::entity::{EntityId, EntityKind};

// =============================================================================
// Obstacle
// =============================================================================

/// A static square block anchored at its top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obstacle {
    id: EntityId,
    position: Position,
}

impl Obstacle {
    /// Arena-assigned identity.
    #[must_use]
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Top-left corner of the footprint.
    #[must_use]
    pub fn position(&self) -> Position {
        self.position
    }
}

// =============================================================================
// Arena
// =============================================================================

/// Container for obstacles and agents.
///
/// Collections keep insertion order. That order is the stepping order, the
/// slot order in recorded frames and the key order in saved maps.
#[derive(Debug, Clone)]
pub struct Arena {
    /// Monotonically increasing occupant id counter.
    next_id: u64,
    /// Extent agents may move within.
    bounds: Bounds,
    obstacles: Vec<Obstacle>,
    autonomous: Vec<AutonomousAgent>,
    controlled: Vec<ControlledAgent>,
}

impl Arena {
    /// Creates an empty arena with the default bounds.
    #[must_use]
    pub fn new() -> Self {
        Self::with_bounds(Bounds::default())
    }

    /// Creates an empty arena with custom bounds.
    #[must_use]
    pub fn with_bounds(bounds: Bounds) -> Self {
        Self {
            next_id: 0,
            bounds,
            obstacles: Vec::new(),
            autonomous: Vec::new(),
            controlled: Vec::new(),
        }
    }

    fn allocate_id(&mut self) -> EntityId {
        let id = EntityId::new(self.next_id);
        self.next_id += 1;
        id
    }

    /// Returns true if any obstacle or agent stands exactly at `(x, y)`.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn occupant_at(&self, x: f64, y: f64) -> bool {
        let at = |p: Position| p.x == x && p.y == y;
        self.obstacles.iter().any(|o| at(o.position))
            || self.autonomous.iter().any(|a| at(a.position()))
            || self.controlled.iter().any(|c| at(c.position()))
    }

    /// Returns true if `position` is already claimed.
    #[must_use]
    pub fn is_occupied(&self, position: Position) -> bool {
        self.occupant_at(position.x, position.y)
    }

    fn reject(kind: EntityKind, position: Position) -> Option<EntityId> {
        debug!(?kind, x = position.x, y = position.y, "placement rejected: cell occupied");
        None
    }

    /// Places an obstacle.
    ///
    /// Returns `None` without changing the arena if the cell is occupied.
    pub fn add_obstacle(&mut self, position: Position) -> Option<EntityId> {
        if self.is_occupied(position) {
            return Self::reject(EntityKind::Obstacle, position);
        }
        let id = self.allocate_id();
        self.obstacles.push(Obstacle { id, position });
        Some(id)
    }

    /// Places an autonomous agent.
    ///
    /// Returns `None` without changing the arena if the cell is occupied.
    pub fn add_autonomous(&mut self, mut agent: AutonomousAgent) -> Option<EntityId> {
        if self.is_occupied(agent.position()) {
            return Self::reject(EntityKind::Autonomous, agent.position());
        }
        let id = self.allocate_id();
        agent.assign_id(id);
        self.autonomous.push(agent);
        Some(id)
    }

    /// Places a controlled agent.
    ///
    /// Returns `None` without changing the arena if the cell is occupied.
    pub fn add_controlled(&mut self, mut agent: ControlledAgent) -> Option<EntityId> {
        if self.is_occupied(agent.position()) {
            return Self::reject(EntityKind::Controlled, agent.position());
        }
        let id = self.allocate_id();
        agent.assign_id(id);
        self.controlled.push(agent);
        Some(id)
    }

    /// Removes an obstacle by id. No-op if absent.
    pub fn remove_obstacle(&mut self, id: EntityId) {
        self.obstacles.retain(|o| o.id != id);
    }

    /// Removes an autonomous agent by id. No-op if absent.
    pub fn remove_autonomous(&mut self, id: EntityId) {
        self.autonomous.retain(|a| a.id() != id);
    }

    /// Removes a controlled agent by id. No-op if absent.
    pub fn remove_controlled(&mut self, id: EntityId) {
        self.controlled.retain(|c| c.id() != id);
    }

    /// Replaces both agent collections.
    ///
    /// Obstacles are kept. Occupancy is not re-checked: the incoming agents
    /// come from a recorded frame, which is authoritative. Every agent gets a
    /// fresh id.
    pub fn restore_agents(
        &mut self,
        autonomous: Vec<AutonomousAgent>,
        controlled: Vec<ControlledAgent>,
    ) {
        self.autonomous.clear();
        self.controlled.clear();
        for mut agent in autonomous {
            let id = self.allocate_id();
            agent.assign_id(id);
            self.autonomous.push(agent);
        }
        for mut agent in controlled {
            let id = self.allocate_id();
            agent.assign_id(id);
            self.controlled.push(agent);
        }
    }

    /// Advances every autonomous agent by one tick.
    ///
    /// Returns the outcome of each agent in insertion order.
    pub fn step_autonomous(&mut self, rng: &mut dyn RngCore) -> Vec<StepOutcome> {
        let mut outcomes = Vec::with_capacity(self.autonomous.len());
        for index in 0..self.autonomous.len() {
            let mut ctx = StepContext {
                rng: &mut *rng,
                move_intent: false,
            };
            let outcome = self.autonomous[index].plan(self, &mut ctx);
            self.autonomous[index].apply(outcome);
            outcomes.push(outcome);
        }
        outcomes
    }

    /// Applies one tick of control input to every controlled agent.
    ///
    /// The turn is applied to all agents first, then each agent attempts its
    /// move along the updated heading when `move_intent` is held.
    pub fn step_controlled(
        &mut self,
        turn: TurnIntent,
        move_intent: bool,
        rng: &mut dyn RngCore,
    ) -> Vec<StepOutcome> {
        if turn != TurnIntent::None {
            for agent in &mut self.controlled {
                agent.turn(turn);
            }
        }

        let mut outcomes = Vec::with_capacity(self.controlled.len());
        for index in 0..self.controlled.len() {
            let mut ctx = StepContext {
                rng: &mut *rng,
                move_intent,
            };
            let outcome = self.controlled[index].plan(self, &mut ctx);
            self.controlled[index].apply(outcome);
            outcomes.push(outcome);
        }
        outcomes
    }

    /// Arena bounds.
    #[must_use]
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Obstacles in insertion order.
    #[must_use]
    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    /// Autonomous agents in insertion order.
    #[must_use]
    pub fn autonomous(&self) -> &[AutonomousAgent] {
        &self.autonomous
    }

    /// Mutable access to autonomous agents, for setup code.
    #[must_use]
    pub fn autonomous_mut(&mut self) -> &mut [AutonomousAgent] {
        &mut self.autonomous
    }

    /// Controlled agents in insertion order.
    #[must_use]
    pub fn controlled(&self) -> &[ControlledAgent] {
        &self.controlled
    }

    /// Total number of obstacles and agents.
    #[must_use]
    pub fn occupant_count(&self) -> usize {
        self.obstacles.len() + self.autonomous.len() + self.controlled.len()
    }

    /// Returns true if the arena holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.occupant_count() == 0
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================
