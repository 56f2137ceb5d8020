//! Keys for the key-indexed records in map files and replay frames.
//!
//! Records are stored as JSON objects keyed `"<prefix><index>"`, e.g.
//! `"obstacle0"` or `"agent12"`. Keys order by numeric index, so a
//! `BTreeMap<SlotKey, _>` iterates in insertion order of the source
//! collection rather than in string order (`agent2` before `agent10`).

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};

use crate::error::SlotKeyError;

/// Record group a key belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum SlotPrefix {
    /// `obstacle<index>`
    Obstacle,
    /// `agent<index>`; `robot<index>` is accepted on read.
    Agent,
}

impl SlotPrefix {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Obstacle => "obstacle",
            Self::Agent => "agent",
        }
    }
}

/// A `<prefix><index>` record key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotKey {
    prefix: SlotPrefix,
    index: u32,
}

impl SlotKey {
    /// Key for the `index`-th obstacle.
    #[must_use]
    pub const fn obstacle(index: u32) -> Self {
        Self {
            prefix: SlotPrefix::Obstacle,
            index,
        }
    }

    /// Key for the `index`-th agent of a collection.
    #[must_use]
    pub const fn agent(index: u32) -> Self {
        Self {
            prefix: SlotPrefix::Agent,
            index,
        }
    }

    /// Key for the `index`-th element of a collection, as a `u32` slot.
    ///
    /// Collections longer than `u32::MAX` are not representable in the
    /// record format; such indices saturate.
    #[must_use]
    pub fn agent_at(index: usize) -> Self {
        Self::agent(u32::try_from(index).unwrap_or(u32::MAX))
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.prefix.as_str(), self.index)
    }
}

impl FromStr for SlotKey {
    type Err = SlotKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SlotKeyError(s.to_owned());
        let split = s.find(|c: char| c.is_ascii_digit()).ok_or_else(invalid)?;
        let (prefix, digits) = s.split_at(split);
        let prefix = match prefix {
            "obstacle" => SlotPrefix::Obstacle,
            "agent" | "robot" => SlotPrefix::Agent,
            _ => return Err(invalid()),
        };
        let index = digits.parse().map_err(|_| invalid())?;
        Ok(Self { prefix, index })
    }
}

impl Serialize for SlotKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SlotKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}
