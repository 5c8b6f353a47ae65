//! Spec Model - Canonical Stand Description
//!
//! All lengths are centimeters. A Spec is plain data: it is built once by the
//! normalizer (or deserialized) and never mutated by the engine.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stand {
    pub width: f64,
    pub depth: f64,
    pub height: f64,
    pub shelf_thickness: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub width: f64,
    pub height: f64,
    pub depth: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layout {
    /// Lateral repeat count.
    pub columns: u32,
    /// Front-to-back repeat count.
    pub depth_count: u32,
    /// Spacing between depth-wise product instances.
    #[serde(default)]
    pub gaps_depth: f64,
    /// Stacked product tiers, one shelf plane each.
    #[serde(default = "default_shelves")]
    pub shelves: u32,
}

fn default_shelves() -> u32 { 1 }

impl Default for Layout {
    fn default() -> Self {
        Self {
            columns: 1,
            depth_count: 1,
            gaps_depth: 0.0,
            shelves: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Spec {
    pub stand: Stand,
    pub product: Product,
    #[serde(default)]
    pub layout: Layout,
}

impl Spec {
    pub fn new(stand: Stand, product: Product, layout: Layout) -> Self {
        Self { stand, product, layout }
    }

    /// Vertical pitch of one tier (shelf plane plus product clearance).
    pub fn tier_pitch(&self) -> f64 {
        self.stand.height / f64::from(self.layout.shelves.max(1))
    }

    /// Height available to a product standing on a shelf.
    pub fn tier_clearance(&self) -> f64 {
        self.tier_pitch() - self.stand.shelf_thickness
    }

    pub fn total_width_needed(&self) -> f64 {
        f64::from(self.layout.columns) * self.product.width
    }

    /// Depth consumed by `depth_count` products and the gaps between them.
    ///
    /// Zero when `depth_count` is zero so a bad count never reports a
    /// negative depth.
    pub fn calculated_depth(&self) -> f64 {
        let count = self.layout.depth_count;
        if count == 0 {
            return 0.0;
        }
        f64::from(count) * self.product.depth + f64::from(count - 1) * self.layout.gaps_depth
    }

    /// Product count across every tier, saturating at `u64::MAX`.
    pub fn total_products(&self) -> u64 {
        u64::from(self.layout.columns)
            .saturating_mul(u64::from(self.layout.depth_count))
            .saturating_mul(u64::from(self.layout.shelves))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Material {
    #[default]
    Cardboard,
    Acrylic,
    Wood,
    Metal,
    Plastic,
}

impl Material {
    pub fn as_str(&self) -> &'static str {
        match self {
            Material::Cardboard => "cardboard",
            Material::Acrylic => "acrylic",
            Material::Wood => "wood",
            Material::Metal => "metal",
            Material::Plastic => "plastic",
        }
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Material {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cardboard" | "corrugated" | "paperboard" => Ok(Material::Cardboard),
            "acrylic" | "plexiglass" => Ok(Material::Acrylic),
            "wood" | "mdf" => Ok(Material::Wood),
            "metal" | "steel" => Ok(Material::Metal),
            "plastic" | "pvc" => Ok(Material::Plastic),
            other => Err(format!("unknown material '{}'", other)),
        }
    }
}

/// Brand metadata carried into the contract alongside the Spec.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandMeta {
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub product: String,
    #[serde(default)]
    pub material: Material,
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Wafer packs on a single tabletop tier; exactly fills the stand depth.
    pub fn wafer_spec() -> Spec {
        Spec {
            stand: Stand { width: 30.0, depth: 30.0, height: 30.0, shelf_thickness: 2.0 },
            product: Product { width: 13.0, height: 5.0, depth: 2.5 },
            layout: Layout { columns: 2, depth_count: 12, gaps_depth: 0.0, shelves: 1 },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calculated_depth_includes_gaps() {
        let mut spec = fixtures::wafer_spec();
        spec.layout.depth_count = 4;
        spec.layout.gaps_depth = 0.5;
        assert_eq!(spec.calculated_depth(), 4.0 * 2.5 + 3.0 * 0.5);
    }

    #[test]
    fn zero_depth_count_has_zero_depth() {
        let mut spec = fixtures::wafer_spec();
        spec.layout.depth_count = 0;
        spec.layout.gaps_depth = 3.0;
        assert_eq!(spec.calculated_depth(), 0.0);
    }

    #[test]
    fn shelves_default_to_one_on_the_wire() {
        let json = r#"{
            "stand": {"width": 30, "depth": 30, "height": 30, "shelfThickness": 2},
            "product": {"width": 13, "height": 5, "depth": 2.5},
            "layout": {"columns": 2, "depthCount": 12, "gapsDepth": 0}
        }"#;
        let spec: Spec = serde_json::from_str(json).unwrap();
        assert_eq!(spec.layout.shelves, 1);
        assert_eq!(spec, fixtures::wafer_spec());
    }

    #[test]
    fn total_products_saturates() {
        let mut spec = fixtures::wafer_spec();
        spec.layout = Layout { columns: u32::MAX, depth_count: u32::MAX, gaps_depth: 0.0, shelves: 2 };
        assert_eq!(spec.total_products(), u64::MAX);

        spec.layout.shelves = 1;
        assert_eq!(spec.total_products(), u64::from(u32::MAX) * u64::from(u32::MAX));
    }

    #[test]
    fn material_parses_aliases() {
        assert_eq!("Corrugated".parse::<Material>().unwrap(), Material::Cardboard);
        assert_eq!(" MDF ".parse::<Material>().unwrap(), Material::Wood);
        assert!("granite".parse::<Material>().is_err());
    }
}
