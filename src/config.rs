use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Tuning knobs of the canvas engine. Every field is optional in the JSON
/// file and falls back to the values below.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub frame_interval_ms: u64,
    pub cull_buffer_px: f32,
    pub index_threshold: usize,
    pub index_margin: f32,
    pub index_max_objects: usize,
    pub index_max_levels: usize,
    pub hit_tolerance_px: f32,
    pub arrow_size: f32,
    pub bounds_epsilon: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: 16,
            cull_buffer_px: 50.0,
            index_threshold: 500,
            index_margin: 1000.0,
            index_max_objects: 10,
            index_max_levels: 5,
            hit_tolerance_px: 5.0,
            arrow_size: 10.0,
            bounds_epsilon: 1.0,
        }
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("expected a positive finite number, got {value}"),
        })
    }
}

impl EngineConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw).map_err(|error| match error {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw).map_err(|source| ConfigError::Parse {
            path: PathBuf::new(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frame_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "frame_interval_ms",
                reason: "must be at least 1".to_owned(),
            });
        }
        if self.index_max_objects == 0 {
            return Err(ConfigError::Invalid {
                field: "index_max_objects",
                reason: "must be at least 1".to_owned(),
            });
        }
        positive("cull_buffer_px", self.cull_buffer_px)?;
        positive("index_margin", self.index_margin)?;
        positive("hit_tolerance_px", self.hit_tolerance_px)?;
        positive("arrow_size", self.arrow_size)?;
        positive("bounds_epsilon", self.bounds_epsilon)?;
        Ok(())
    }

    pub fn frame_interval_secs(&self) -> f64 {
        self.frame_interval_ms as f64 / 1000.0
    }
}
