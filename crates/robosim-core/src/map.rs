//! Arena descriptions and the on-disk map store.
//!
//! A map file is a JSON object with three groups, each keyed by slot:
//!
//! ```json
//! {
//!   "obstacles": {"obstacle0": {"x": 4, "y": 2}},
//!   "agents": {"agent0": {"x": 1, "y": 1}},
//!   "controlled_agents": {"agent0": {"x": 10, "y": 5}}
//! }
//! ```
//!
//! Coordinates are whole grid units. They are multiplied by the grid scale
//! when an arena is built and divided (rounded) when one is saved. Files
//! using the older `robots`/`controlledRobots` group names and `robot<i>`
//! keys are read as well.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use robosim_geom::{Bounds, Position};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::agent::{Agent, AutonomousAgent, ControlledAgent};
use crate::arena::Arena;
use crate::error::MapError;
use crate::slot::SlotKey;

/// Map name that always loads an empty arena.
pub const EMPTY_MAP: &str = "new";

/// A point in grid units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridPoint {
    /// Column.
    pub x: i64,
    /// Row.
    pub y: i64,
}

impl GridPoint {
    /// Creates a grid point.
    #[must_use]
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Pixel position of this point at `scale` pixels per unit.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn to_position(self, scale: f64) -> Position {
        Position::new(self.x as f64, self.y as f64).scaled(scale)
    }

    /// Nearest grid point to `position`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_position(position: Position, scale: f64) -> Self {
        Self::new(
            (position.x / scale).round() as i64,
            (position.y / scale).round() as i64,
        )
    }
}

/// Serialized layout of an arena.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArenaDescription {
    /// Obstacle corners.
    #[serde(default)]
    pub obstacles: BTreeMap<SlotKey, GridPoint>,
    /// Autonomous agent positions.
    #[serde(default, alias = "robots")]
    pub agents: BTreeMap<SlotKey, GridPoint>,
    /// Controlled agent positions.
    #[serde(default, alias = "controlledRobots")]
    pub controlled_agents: BTreeMap<SlotKey, GridPoint>,
}

impl ArenaDescription {
    /// Builds an arena, inserting records in slot order.
    ///
    /// Records that land on an occupied cell are skipped, the same way an
    /// interactive placement would be rejected.
    #[must_use]
    pub fn build_arena(&self, bounds: Bounds, scale: f64) -> Arena {
        let mut arena = Arena::with_bounds(bounds);
        let mut skipped = 0usize;
        for point in self.obstacles.values() {
            skipped += usize::from(arena.add_obstacle(point.to_position(scale)).is_none());
        }
        for point in self.agents.values() {
            let agent = AutonomousAgent::new(point.to_position(scale));
            skipped += usize::from(arena.add_autonomous(agent).is_none());
        }
        for point in self.controlled_agents.values() {
            let agent = ControlledAgent::new(point.to_position(scale));
            skipped += usize::from(arena.add_controlled(agent).is_none());
        }
        if skipped > 0 {
            warn!(skipped, "arena description has overlapping records");
        }
        arena
    }

    /// Describes the current layout of `arena`.
    #[must_use]
    pub fn from_arena(arena: &Arena, scale: f64) -> Self {
        let grid = |p: Position| GridPoint::from_position(p, scale);
        Self {
            obstacles: (0u32..)
                .zip(arena.obstacles())
                .map(|(i, o)| (SlotKey::obstacle(i), grid(o.position())))
                .collect(),
            agents: arena
                .autonomous()
                .iter()
                .enumerate()
                .map(|(i, a)| (SlotKey::agent_at(i), grid(a.position())))
                .collect(),
            controlled_agents: arena
                .controlled()
                .iter()
                .enumerate()
                .map(|(i, c)| (SlotKey::agent_at(i), grid(c.position())))
                .collect(),
        }
    }

    /// Total number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.obstacles.len() + self.agents.len() + self.controlled_agents.len()
    }

    /// Returns true if the description holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A named arena description, as handed to the simulation controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArenaSource {
    /// Name used for replay log file names.
    pub name: String,
    /// Layout to build.
    pub description: ArenaDescription,
}

impl ArenaSource {
    /// Creates a source from a name and layout.
    #[must_use]
    pub fn new(name: impl Into<String>, description: ArenaDescription) -> Self {
        Self {
            name: name.into(),
            description,
        }
    }

    /// The empty arena, named [`EMPTY_MAP`].
    #[must_use]
    pub fn empty() -> Self {
        Self::new(EMPTY_MAP, ArenaDescription::default())
    }
}

/// Directory of `<name>.json` arena descriptions.
#[derive(Debug, Clone)]
pub struct MapStore {
    dir: PathBuf,
}

impl MapStore {
    /// Creates a store rooted at `dir`. The directory is created on first
    /// save.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, name: &str) -> Result<PathBuf, MapError> {
        let invalid = name.is_empty()
            || name == EMPTY_MAP
            || name.starts_with('.')
            || name.contains(['/', '\\']);
        if invalid {
            return Err(MapError::InvalidName(name.to_owned()));
        }
        Ok(self.dir.join(format!("{name}.json")))
    }

    /// Loads the description called `name`. [`EMPTY_MAP`] yields an empty
    /// description without touching the disk.
    ///
    /// # Errors
    ///
    /// [`MapError::NotFound`], [`MapError::Unreadable`],
    /// [`MapError::Malformed`] or [`MapError::InvalidName`].
    pub fn load(&self, name: &str) -> Result<ArenaDescription, MapError> {
        if name == EMPTY_MAP {
            return Ok(ArenaDescription::default());
        }
        let path = self.path_for(name)?;
        let content = fs::read_to_string(&path).map_err(|source| match source.kind() {
            ErrorKind::NotFound => MapError::NotFound {
                name: name.to_owned(),
                path: path.clone(),
            },
            _ => MapError::Unreadable {
                path: path.clone(),
                source,
            },
        })?;
        let description: ArenaDescription =
            serde_json::from_str(&content).map_err(|source| MapError::Malformed {
                path: path.clone(),
                source,
            })?;
        debug!(name, records = description.len(), "map loaded");
        Ok(description)
    }

    /// Loads `name` as an [`ArenaSource`].
    ///
    /// # Errors
    ///
    /// As [`load`](Self::load).
    pub fn source(&self, name: &str) -> Result<ArenaSource, MapError> {
        Ok(ArenaSource::new(name, self.load(name)?))
    }

    /// Writes `description` as `name`, replacing any existing map of that
    /// name. Returns the file path.
    ///
    /// # Errors
    ///
    /// [`MapError::InvalidName`], [`MapError::Encode`] or [`MapError::Write`].
    pub fn save(&self, name: &str, description: &ArenaDescription) -> Result<PathBuf, MapError> {
        let path = self.path_for(name)?;
        let write_err = |source| MapError::Write {
            path: path.clone(),
            source,
        };
        fs::create_dir_all(&self.dir).map_err(write_err)?;
        let content = serde_json::to_string_pretty(description).map_err(|source| MapError::Encode {
            name: name.to_owned(),
            source,
        })?;
        fs::write(&path, content).map_err(write_err)?;
        info!(name, path = %path.display(), "map saved");
        Ok(path)
    }

    /// Names of all stored maps, sorted. A missing directory holds no maps.
    ///
    /// # Errors
    ///
    /// [`MapError::Unreadable`] if the directory exists but cannot be read.
    pub fn list(&self) -> Result<Vec<String>, MapError> {
        let unreadable = |source| MapError::Unreadable {
            path: self.dir.clone(),
            source,
        };
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(unreadable(e)),
        };

        let mut names = Vec::new();
        for entry in entries {
            let path = entry.map_err(unreadable)?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Deletes the map called `name`.
    ///
    /// # Errors
    ///
    /// [`MapError::NotFound`], [`MapError::Delete`] or
    /// [`MapError::InvalidName`].
    pub fn delete(&self, name: &str) -> Result<(), MapError> {
        let path = self.path_for(name)?;
        fs::remove_file(&path).map_err(|source| match source.kind() {
            ErrorKind::NotFound => MapError::NotFound {
                name: name.to_owned(),
                path: path.clone(),
            },
            _ => MapError::Delete {
                path: path.clone(),
                source,
            },
        })?;
        info!(name, "map deleted");
        Ok(())
    }
}
