//! Profile System - Domain Defaults
//!
//! Product profiles fill missing product dimensions; stand types fill missing
//! stand dimensions. Both are read-only once loaded.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, warn};

use crate::spec::{Product, Stand};

pub type ProfileId = String;

/// Id of the reference product used when a form names no category.
pub const REFERENCE_PROFILE: &str = "wafer-cookie";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductProfile {
    pub id: ProfileId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub width: f64,
    pub height: f64,
    pub depth: f64,
}

impl ProductProfile {
    pub fn product(&self) -> Product {
        Product {
            width: self.width,
            height: self.height,
            depth: self.depth,
        }
    }

    pub fn has_positive_dimensions(&self) -> bool {
        [self.width, self.height, self.depth]
            .iter()
            .all(|v| v.is_finite() && *v > 0.0)
    }

    pub fn wafer_cookie() -> Self {
        Self {
            id: REFERENCE_PROFILE.to_string(),
            name: "Wafer Cookie".to_string(),
            description: "Single wafer pack standing on edge".to_string(),
            width: 13.0,
            height: 5.0,
            depth: 2.5,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StandType {
    #[default]
    Tabletop,
    Floor,
    Counter,
    GravityFeed,
    Pallet,
}

impl StandType {
    pub const ALL: [StandType; 5] = [
        StandType::Tabletop,
        StandType::Floor,
        StandType::Counter,
        StandType::GravityFeed,
        StandType::Pallet,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StandType::Tabletop => "tabletop",
            StandType::Floor => "floor",
            StandType::Counter => "counter",
            StandType::GravityFeed => "gravity-feed",
            StandType::Pallet => "pallet",
        }
    }

    /// Stock dimensions for this stand type.
    ///
    /// Only the stand's own dimensions; layout counts are never implied by
    /// the stand type.
    pub fn defaults(&self) -> Stand {
        let (width, depth, height, shelf_thickness) = match self {
            StandType::Tabletop => (30.0, 30.0, 30.0, 2.0),
            StandType::Counter => (40.0, 25.0, 35.0, 2.0),
            StandType::GravityFeed => (35.0, 40.0, 45.0, 1.5),
            StandType::Floor => (60.0, 40.0, 160.0, 2.5),
            StandType::Pallet => (120.0, 80.0, 140.0, 3.0),
        };
        Stand { width, depth, height, shelf_thickness }
    }
}

impl fmt::Display for StandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StandType {
    type Err = String;

    /// Accepts form labels such as "Tabletop Stand", "floor_display" or
    /// "Gravity Feed".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase().replace(['_', ' '], "-");
        let key = lowered
            .trim_end_matches("-stand")
            .trim_end_matches("-display")
            .trim_matches('-');
        match key {
            "tabletop" | "table-top" | "table" => Ok(StandType::Tabletop),
            "floor" | "floorstand" => Ok(StandType::Floor),
            "counter" | "countertop" | "counter-top" => Ok(StandType::Counter),
            "gravity-feed" | "gravity" => Ok(StandType::GravityFeed),
            "pallet" => Ok(StandType::Pallet),
            _ => Err(format!("unknown stand type '{}'", s.trim())),
        }
    }
}

/// Profile registry - loads product profiles once, then read-only
#[derive(Debug, Clone)]
pub struct ProfileRegistry {
    profiles: BTreeMap<ProfileId, ProductProfile>,
}

impl ProfileRegistry {
    /// Registry holding only the reference profile.
    pub fn new() -> Self {
        let mut profiles = BTreeMap::new();
        let reference = ProductProfile::wafer_cookie();
        profiles.insert(reference.id.clone(), reference);
        Self { profiles }
    }

    /// Loads every `*.json` profile in `dir` on top of the reference profile.
    ///
    /// Files that fail to parse are skipped with a warning; a missing
    /// directory yields the built-in registry.
    pub fn load_from_dir(dir: &Path) -> Result<Self, std::io::Error> {
        let mut registry = Self::new();
        if dir.exists() {
            for entry in fs::read_dir(dir)? {
                let path = entry?.path();
                if path.extension().map_or(false, |e| e == "json") {
                    let content = fs::read_to_string(&path)?;
                    match serde_json::from_str::<ProductProfile>(&content) {
                        Ok(profile) if !profile.has_positive_dimensions() => {
                            warn!(id = %profile.id, path = %path.display(), "skipping profile with non-positive dimensions");
                        }
                        Ok(profile) => {
                            debug!(id = %profile.id, path = %path.display(), "loaded product profile");
                            registry.register(profile);
                        }
                        Err(e) => warn!(path = %path.display(), error = %e, "skipping malformed profile"),
                    }
                }
            }
        }
        Ok(registry)
    }

    pub fn get(&self, id: &str) -> Option<&ProductProfile> {
        self.profiles.get(id)
    }

    pub fn reference(&self) -> Option<&ProductProfile> {
        self.profiles.get(REFERENCE_PROFILE)
    }

    /// Profiles in id order.
    pub fn list(&self) -> Vec<&ProductProfile> {
        self.profiles.values().collect()
    }

    pub fn register(&mut self, profile: ProductProfile) {
        self.profiles.insert(profile.id.clone(), profile);
    }
}

impl Default for ProfileRegistry {
    fn default() -> Self {
        Self::new()
    }
}
