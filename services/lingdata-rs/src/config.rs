//! Runtime configuration for the distance engine.
//!
//! Every field has a default matching the ASJP / Glottolog conventions, so an
//! empty JSON object (or no file at all) yields a usable configuration.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Mean earth radius used by geopy's great-circle distance, in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.009;

/// How many processed items make up one checkpoint batch.
pub const DEFAULT_CHECKPOINT_INTERVAL: usize = 10_000;

/// Unit over which edit distances are counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Segmentation {
    /// Unicode scalar values, as ASJPcode transcriptions are plain ASCII.
    #[default]
    CodePoint,
    /// Extended grapheme clusters, for IPA input with combining marks.
    Grapheme,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LexicalConfig {
    /// Pairs sharing this many meanings or fewer are not compared.
    pub min_common_meanings: usize,
    pub segmentation: Segmentation,
    /// Meanings kept when building wordlists; `None` keeps all of them.
    pub core_meanings: Option<BTreeSet<String>>,
}

impl Default for LexicalConfig {
    fn default() -> Self {
        Self {
            min_common_meanings: 2,
            segmentation: Segmentation::CodePoint,
            core_meanings: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeoConfig {
    pub earth_radius_km: f64,
}

impl Default for GeoConfig {
    fn default() -> Self {
        Self {
            earth_radius_km: EARTH_RADIUS_KM,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub lexical: LexicalConfig,
    pub geo: GeoConfig,
    pub checkpoint_interval: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lexical: LexicalConfig::default(),
            geo: GeoConfig::default(),
            checkpoint_interval: DEFAULT_CHECKPOINT_INTERVAL,
        }
    }
}

impl Config {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}
