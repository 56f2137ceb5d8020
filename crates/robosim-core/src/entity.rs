//! Identity for arena occupants.
//!
//! Every obstacle and agent placed in an [`Arena`](crate::arena::Arena) gets
//! an [`EntityId`]. Movement legality uses the id to exclude an agent from
//! its own collision checks, and removal goes through it as well, so two
//! occupants that happen to share coordinates are still told apart.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for an arena occupant.
///
/// Ids are handed out by the arena from a monotonically increasing counter
/// and are never reused within one arena value.
///
/// # Example
///
/// ```
/// use robosim_core::entity::EntityId;
///
/// let id1 = EntityId::new(1);
/// let id2 = EntityId::new(2);
///
/// assert!(id1 < id2);
/// assert_eq!(id1.as_u64(), 1);
/// ```
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    /// Creates a new `EntityId` from a raw `u64` value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw `u64` value of this identifier.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for EntityId {
    fn from(id: u64) -> Self {
        Self::new(id)
    }
}

/// Occupant classification.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// Static square block.
    Obstacle,
    /// Agent that wanders on its own.
    Autonomous,
    /// Agent steered by control intents.
    Controlled,
}
