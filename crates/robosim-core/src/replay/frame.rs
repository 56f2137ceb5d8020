//! Frame records stored in the replay log.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::agent::Angle;
use crate::slot::SlotKey;

/// Recorded state of one agent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentRecord {
    /// Horizontal position.
    pub x: f64,
    /// Vertical position.
    pub y: f64,
    /// Rendered heading.
    pub angle: Angle,
}

/// Agent state captured at the end of a tick, before an id is assigned.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    /// Autonomous agents in collection order.
    pub agents: Vec<AgentRecord>,
    /// Controlled agents in collection order.
    pub controlled_agents: Vec<AgentRecord>,
}

/// One tick of recorded history.
///
/// Serialized as
/// `{"id": 4, "agents": {"agent0": {"x": .., "y": .., "angle": ..}}, "controlled_agents": {..}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Position in the log, starting at 0.
    pub id: u64,
    /// Autonomous agents by slot.
    #[serde(default, alias = "robots")]
    pub agents: BTreeMap<SlotKey, AgentRecord>,
    /// Controlled agents by slot.
    #[serde(default, alias = "controlledRobots")]
    pub controlled_agents: BTreeMap<SlotKey, AgentRecord>,
}

impl Frame {
    /// Tags a snapshot with `id`.
    #[must_use]
    pub fn new(id: u64, snapshot: &Snapshot) -> Self {
        Self {
            id,
            agents: keyed(&snapshot.agents),
            controlled_agents: keyed(&snapshot.controlled_agents),
        }
    }

    /// Returns the agent records in slot order.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            agents: self.agents.values().copied().collect(),
            controlled_agents: self.controlled_agents.values().copied().collect(),
        }
    }
}

fn keyed(records: &[AgentRecord]) -> BTreeMap<SlotKey, AgentRecord> {
    records
        .iter()
        .enumerate()
        .map(|(i, r)| (SlotKey::agent_at(i), *r))
        .collect()
}

/// Scrub direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Toward later frames.
    Forward,
    /// Toward earlier frames.
    Backward,
}

impl Direction {
    /// The frame id one step from `cursor`, or `None` below zero.
    #[must_use]
    pub fn from_cursor(self, cursor: u64) -> Option<u64> {
        match self {
            Self::Forward => cursor.checked_add(1),
            Self::Backward => cursor.checked_sub(1),
        }
    }
}
