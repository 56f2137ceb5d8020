//! Simulation configuration.

use std::fs;
use std::path::{Path, PathBuf};

use robosim_geom::{Bounds, GRID_SCALE};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Configuration for a [`Simulation`](crate::simulation::Simulation).
///
/// Every field has a default, so a config file only needs the fields it
/// changes:
///
/// ```
/// use robosim_core::config::SimConfig;
///
/// let config: SimConfig = serde_json::from_str(r#"{"seed": 7}"#).unwrap();
/// assert_eq!(config.seed, 7);
/// assert_eq!(config.tick_rate_hz, 120);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Arena extent in pixels.
    pub bounds: Bounds,
    /// Pixels per grid unit in arena descriptions.
    pub grid_scale: f64,
    /// Seed for the retargeting RNG.
    pub seed: u64,
    /// Tick rate drivers should cap at. The engine itself is clockless.
    pub tick_rate_hz: u32,
    /// Where replay logs are created.
    pub log_dir: PathBuf,
    /// Where arena descriptions are stored.
    pub map_dir: PathBuf,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            bounds: Bounds::default(),
            grid_scale: GRID_SCALE,
            seed: 0,
            tick_rate_hz: 120,
            log_dir: PathBuf::from("data/logs"),
            map_dir: PathBuf::from("data/maps"),
        }
    }
}

impl SimConfig {
    /// Loads a config from a JSON file. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Io`] if the file cannot be read and
    /// [`ConfigError::Parse`] if it is not a valid config object.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Sets the RNG seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the arena bounds.
    #[must_use]
    pub fn with_bounds(mut self, bounds: Bounds) -> Self {
        self.bounds = bounds;
        self
    }

    /// Sets the replay log directory.
    #[must_use]
    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = dir.into();
        self
    }

    /// Sets the map directory.
    #[must_use]
    pub fn with_map_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.map_dir = dir.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_classic_arena() {
        let config = SimConfig::default();
        assert_eq!(config.bounds, Bounds::new(1110.0, 630.0));
        assert!((config.grid_scale - 30.0).abs() < f64::EPSILON);
        assert_eq!(config.tick_rate_hz, 120);
    }

    #[test]
    fn load_reads_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sim.json");
        fs::write(&path, r#"{"seed": 42, "log_dir": "/tmp/robo-logs"}"#).unwrap();

        let config = SimConfig::load(&path).unwrap();
        assert_eq!(config.seed, 42);
        assert_eq!(config.log_dir, PathBuf::from("/tmp/robo-logs"));
        assert_eq!(config.map_dir, PathBuf::from("data/maps"));
    }

    #[test]
    fn load_reports_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(matches!(SimConfig::load(&missing), Err(ConfigError::Io { .. })));

        let bad = dir.path().join("bad.json");
        fs::write(&bad, r#"{"seed": "seven"}"#).unwrap();
        assert!(matches!(SimConfig::load(&bad), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn builders_chain() {
        let config = SimConfig::default()
            .with_seed(9)
            .with_bounds(Bounds::new(300.0, 300.0))
            .with_log_dir("logs")
            .with_map_dir("maps");
        assert_eq!(config.seed, 9);
        assert_eq!(config.bounds.width, 300.0);
        assert_eq!(config.log_dir, PathBuf::from("logs"));
        assert_eq!(config.map_dir, PathBuf::from("maps"));
    }
}
