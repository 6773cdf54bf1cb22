//! Tunables for the metric and layout computations.
//!
//! Every section has defaults, so a configuration file only needs the keys it changes:
//!
//! ```rust
//! use tablegraph::config::AnalysisConfig;
//!
//! let config = AnalysisConfig::from_toml_str(
//!     r#"
//!     [louvain]
//!     seed = 7
//!
//!     [layout]
//!     iterations = 100
//!     "#,
//! )
//! .unwrap();
//!
//! assert_eq!(config.louvain.seed, 7);
//! assert_eq!(config.louvain.resolution, 1.0);
//! assert_eq!(config.layout.iterations, 100);
//! ```

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// The full configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    pub louvain: LouvainConfig,
    pub layout: LayoutConfig,
    pub betweenness: BetweennessConfig,
}

impl AnalysisConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Reads the configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }
}

/// Louvain community detection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LouvainConfig {
    /// Seeds the order nodes are visited in, the only source of randomness.
    pub seed: u64,
    /// Values above 1 favour smaller communities, below 1 larger ones.
    pub resolution: f64,
    /// Upper bound on aggregation levels.
    pub max_levels: usize,
    /// Upper bound on local-moving sweeps per level.
    pub max_sweeps: usize,
}

impl Default for LouvainConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            resolution: 1.0,
            max_levels: 32,
            max_sweeps: 128,
        }
    }
}

/// Node placement.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutConfig {
    /// Seeds the initial force-directed placement.
    pub seed: u64,
    /// Force-directed iterations.
    pub iterations: usize,
    /// Half-width of the square positions are scaled into.
    pub scale: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            iterations: 500,
            scale: 1.0,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BetweennessConfig {
    pub normalized: bool,
}
