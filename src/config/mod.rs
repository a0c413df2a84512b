//! Configuration for batch fusion and tag generation.
//!
//! Configuration is loaded with precedence: overrides > Env vars > Config file > Defaults
//!
//! # Example config file (unifuse.toml)
//! ```toml
//! [batch]
//! threads = 8
//! min_parallel_clusters = 128
//!
//! [tags]
//! prefix = "person"
//! ```

mod defaults;

pub use defaults::*;

use crate::tag::TagGenerator;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration for the fusion engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    /// Batch fusion settings
    pub batch: BatchConfig,
    /// Tag generation settings, applied through [`FusionConfig::tag_generator`]
    pub tags: TagConfig,
}

impl FusionConfig {
    /// Load configuration with precedence: overrides > Env > File > Defaults
    ///
    /// # Arguments
    /// * `config_path` - Optional path to TOML config file
    /// * `overrides` - Explicit overrides to apply on top
    pub fn load(config_path: Option<&Path>, overrides: ConfigOverrides) -> Result<Self, ConfigLoadError> {
        let mut figment = Figment::new().merge(Serialized::defaults(FusionConfig::default()));

        // Layer 1: Config file (if provided)
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Layer 2: Environment variables with UNIFUSE_ prefix
        figment = figment.merge(Env::prefixed(ENV_PREFIX).split(ENV_SPLIT));

        // Layer 3: Explicit overrides
        figment = figment.merge(Serialized::defaults(overrides));

        let config: FusionConfig = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment and optional config file only (no overrides)
    pub fn from_env(config_path: Option<&Path>) -> Result<Self, ConfigLoadError> {
        Self::load(config_path, ConfigOverrides::default())
    }

    fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.tags.prefix.trim().is_empty() {
            return Err(ConfigLoadError::Invalid {
                key: "tags.prefix",
                message: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// A fresh tag generator using the configured prefix
    pub fn tag_generator(&self) -> TagGenerator {
        TagGenerator::new(self.tags.prefix.clone())
    }
}

/// Batch fusion configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Worker threads for batch fusion (0 = global rayon pool)
    pub threads: usize,
    /// Smallest batch fused in parallel
    pub min_parallel_clusters: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            threads: DEFAULT_BATCH_THREADS,
            min_parallel_clusters: DEFAULT_MIN_PARALLEL_CLUSTERS,
        }
    }
}

/// Tag generation configuration.
///
/// Tags are named while a merge is built, so the engine never reads this section.
/// Hand [`FusionConfig::tag_generator`] to `MergeBuilder::with_tag_generator`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TagConfig {
    /// Prefix of generated tag names
    pub prefix: String,
}

impl Default for TagConfig {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_TAG_PREFIX.to_string(),
        }
    }
}

/// Overrides that take precedence over file and env config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch: Option<BatchOverrides>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<TagOverrides>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threads: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_parallel_clusters: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TagOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
}

/// Configuration loading error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("configuration error: {0}")]
    Figment(#[from] Box<figment::Error>),
    #[error("configuration error: {key} {message}")]
    Invalid { key: &'static str, message: String },
}

impl From<figment::Error> for ConfigLoadError {
    fn from(e: figment::Error) -> Self {
        Self::Figment(Box::new(e))
    }
}
