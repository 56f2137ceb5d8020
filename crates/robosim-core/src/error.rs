//! Error types for the simulation engine.
//!
//! Placement conflicts and scrubbing past either end of the log are not
//! errors; they surface as `None` results. Everything here is an actual
//! failure the caller has to deal with.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::simulation::SimState;

/// Failure while creating, writing or reading a replay log.
#[derive(Debug, Error)]
pub enum LogError {
    /// Log files are unique per session and are never overwritten.
    #[error("replay log {0} already exists")]
    AlreadyExists(PathBuf),
    /// The log directory could not be created.
    #[error("failed to create log directory {path}: {source}")]
    CreateDir {
        /// Directory that was being created.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// Reading, writing or rewriting the log file failed.
    #[error("i/o error on replay log {path}: {source}")]
    Io {
        /// Log file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// A frame could not be serialized.
    #[error("failed to encode frame {id}: {source}")]
    Encode {
        /// Id the frame was to be written under.
        id: u64,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },
    /// The log file is not a valid frame array.
    #[error("replay log {path} is malformed: {source}")]
    Parse {
        /// Log file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },
    /// The file does not end in a closing `]`.
    #[error("replay log {0} is not a frame array")]
    NotAnArray(PathBuf),
    /// An append was attempted while scrubbing.
    #[error("replay log is being scrubbed; truncate it before appending")]
    NotLive,
}

/// Failure while reading or writing an arena description.
#[derive(Debug, Error)]
pub enum MapError {
    /// No map file with that name exists.
    #[error("map {name} not found at {path}")]
    NotFound {
        /// Requested map name.
        name: String,
        /// Path that was looked up.
        path: PathBuf,
    },
    /// The map file or directory exists but could not be read.
    #[error("map file {path} is unreadable: {source}")]
    Unreadable {
        /// File or directory.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// The map file is not a valid arena description.
    #[error("map file {path} is malformed: {source}")]
    Malformed {
        /// Map file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },
    /// The description could not be serialized.
    #[error("failed to encode map {name}: {source}")]
    Encode {
        /// Map name.
        name: String,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },
    /// The map file could not be written.
    #[error("failed to write map file {path}: {source}")]
    Write {
        /// Map file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// The map file could not be removed.
    #[error("failed to delete map file {path}: {source}")]
    Delete {
        /// Map file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// Empty names, path separators, leading dots and the reserved name `new`.
    #[error("invalid map name {0:?}")]
    InvalidName(String),
}

/// Failure while loading a [`SimConfig`](crate::config::SimConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        /// Config file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// The config file is not a valid config object.
    #[error("config {path} is malformed: {source}")]
    Parse {
        /// Config file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },
}

/// A slot key that is not `<prefix><index>`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid slot key {0:?}")]
pub struct SlotKeyError(pub String);

/// Failure of a simulation controller operation.
#[derive(Debug, Error)]
pub enum SimError {
    /// Loading or saving a map failed.
    #[error(transparent)]
    Map(#[from] MapError),
    /// Recording or replaying failed.
    #[error(transparent)]
    Log(#[from] LogError),
    /// The requested operation is not allowed in the current state.
    #[error("cannot {action} while {state}")]
    InvalidTransition {
        /// State the controller was in.
        state: SimState,
        /// Rejected operation.
        action: &'static str,
    },
}
