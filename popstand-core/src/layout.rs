//! Layout Solver - Packing Facts From a Valid Spec
//!
//! Pure arithmetic on the Spec's own numbers. No rounding, no unit changes.

use serde::{Deserialize, Serialize};

use crate::spec::Spec;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutPlan {
    pub columns: u32,
    pub depth_count: u32,
    pub shelves: u32,
    pub per_shelf_capacity: u64,
    pub total_capacity: u64,
    /// Products sit side by side.
    pub lateral_gap: f64,
    /// Free width left on each side of the centered product block.
    pub lateral_margin: f64,
    /// Distance between the fronts of consecutive depth slots.
    pub depth_pitch: f64,
    pub depth_gap: f64,
    pub used_depth: f64,
    /// Unused depth behind the last slot.
    pub depth_slack: f64,
    pub tier_pitch: f64,
    pub tier_clearance: f64,
    /// Space above a product inside its tier.
    pub headroom: f64,
}

impl LayoutPlan {
    /// Front-left-bottom corner of a product slot in stand coordinates.
    pub fn slot_origin(&self, spec: &Spec, shelf: u32, column: u32, slot: u32) -> [f64; 3] {
        [
            self.lateral_margin + f64::from(column) * spec.product.width,
            f64::from(shelf) * self.tier_pitch + spec.stand.shelf_thickness,
            f64::from(slot) * self.depth_pitch,
        ]
    }
}

/// Derive packing quantities. Assumes `spec` passed the math gate.
pub fn solve(spec: &Spec) -> LayoutPlan {
    let layout = &spec.layout;
    let per_shelf_capacity = u64::from(layout.columns) * u64::from(layout.depth_count);
    let used_depth = spec.calculated_depth();
    let tier_pitch = spec.tier_pitch();
    let tier_clearance = spec.tier_clearance();

    LayoutPlan {
        columns: layout.columns,
        depth_count: layout.depth_count,
        shelves: layout.shelves,
        per_shelf_capacity,
        total_capacity: spec.total_products(),
        lateral_gap: 0.0,
        lateral_margin: (spec.stand.width - spec.total_width_needed()) / 2.0,
        depth_pitch: spec.product.depth + layout.gaps_depth,
        depth_gap: layout.gaps_depth,
        used_depth,
        depth_slack: spec.stand.depth - used_depth,
        tier_pitch,
        tier_clearance,
        headroom: tier_clearance - spec.product.height,
    }
}
