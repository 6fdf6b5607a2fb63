use std::error::Error;
use std::fs;
use std::path::Path;
use std::thread;

use serde::Deserialize;

/// Worker and scheduling knobs, loaded from TOML.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Total worker threads; 0 picks the available parallelism.
    pub workers: usize,
    /// Workers reserved for hinted (near) requests.
    pub near_lane_workers: usize,
    /// Resubmit a block whose finished build was rejected as stale.
    pub resubmit_stale: bool,
    /// Render distance of blocks without a farther-reaching structure.
    pub default_render_distance: f32,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            workers: 0,
            near_lane_workers: 1,
            resubmit_stale: true,
            default_render_distance: 64.0,
        }
    }
}

impl RuntimeConfig {
    pub fn from_toml_str(toml_str: &str) -> Result<Self, Box<dyn Error>> {
        let cfg: RuntimeConfig = toml::from_str(toml_str)?;
        if !(cfg.default_render_distance > 0.0) {
            return Err(format!(
                "default_render_distance must be positive, got {}",
                cfg.default_render_distance
            )
            .into());
        }
        Ok(cfg)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, Box<dyn Error>> {
        let s = fs::read_to_string(path)?;
        Self::from_toml_str(&s)
    }

    /// Splits the worker budget into (near, background) lanes. Always at least one worker.
    pub fn worker_split(&self) -> (usize, usize) {
        let total = if self.workers == 0 {
            thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
        } else {
            self.workers
        };
        let near = self.near_lane_workers.min(total);
        let bg = total - near;
        if near + bg == 0 { (0, 1) } else { (near, bg) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let cfg = RuntimeConfig::from_toml_str("workers = 3").unwrap();
        assert_eq!(cfg.workers, 3);
        assert_eq!(cfg.near_lane_workers, 1);
        assert!(cfg.resubmit_stale);
    }

    #[test]
    fn rejects_non_positive_render_distance() {
        assert!(RuntimeConfig::from_toml_str("default_render_distance = 0.0").is_err());
    }

    #[test]
    fn split_never_exceeds_budget() {
        let cfg = RuntimeConfig {
            workers: 1,
            near_lane_workers: 4,
            ..RuntimeConfig::default()
        };
        assert_eq!(cfg.worker_split(), (1, 0));
        let cfg = RuntimeConfig {
            workers: 6,
            near_lane_workers: 2,
            ..RuntimeConfig::default()
        };
        assert_eq!(cfg.worker_split(), (2, 4));
    }
}
