//! Geometry Builder - Scene Graph From a Valid Spec
//!
//! The scene is an arena of axis-aligned boxes. Links only point from parent
//! to child. Coordinates are centimeters with the origin at the stand's
//! front-bottom-left corner: +x across the width, +y up, +z toward the back.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::layout::{self, LayoutPlan};
use crate::spec::Spec;
use crate::validation::Measurements;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub usize);

/// Axis-aligned box given by its minimum corner and extent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: [f64; 3],
    pub size: [f64; 3],
}

impl Aabb {
    pub fn new(min: [f64; 3], size: [f64; 3]) -> Self {
        Self { min, size }
    }

    pub fn max(&self) -> [f64; 3] {
        [
            self.min[0] + self.size[0],
            self.min[1] + self.size[1],
            self.min[2] + self.size[2],
        ]
    }

    /// Eight corners, bottom face first, counter-clockwise seen from above
    /// starting at the front-left.
    pub fn corners(&self) -> [[f64; 3]; 8] {
        let [x0, y0, z0] = self.min;
        let [x1, y1, z1] = self.max();
        [
            [x0, y0, z0],
            [x1, y0, z0],
            [x1, y0, z1],
            [x0, y0, z1],
            [x0, y1, z0],
            [x1, y1, z0],
            [x1, y1, z1],
            [x0, y1, z1],
        ]
    }

    /// True when `other` lies inside `self`, faces may touch.
    pub fn contains(&self, other: &Aabb) -> bool {
        let (a_max, b_max) = (self.max(), other.max());
        (0..3).all(|i| other.min[i] >= self.min[i] && b_max[i] <= a_max[i])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
    StandShell,
    Shelf { index: u32 },
    Product { shelf: u32, column: u32, slot: u32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneNode {
    pub id: NodeId,
    pub name: String,
    pub kind: NodeKind,
    pub bounds: Aabb,
    pub children: Vec<NodeId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationKind {
    StandWidth,
    StandHeight,
    StandDepth,
    CalculatedDepth,
    AvailableDepth,
    DepthDifference,
    TotalProducts,
}

/// Anchor for a human-readable dimension overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub kind: AnnotationKind,
    pub value: f64,
    pub unit: String,
    pub label: String,
    pub start: [f64; 3],
    pub end: [f64; 3],
}

/// Only [`build`] produces a scene; the arena layout is never read back
/// from JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneGraph {
    nodes: Vec<SceneNode>,
    annotations: Vec<Annotation>,
    shelf_count: u32,
    columns: u32,
    depth_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneSummary {
    pub primitives: usize,
    pub shelves: usize,
    pub products: usize,
    pub annotations: usize,
}

const ROOT: NodeId = NodeId(0);
// Distance dimension lines sit outside the stand.
const LABEL_OFFSET: f64 = 5.0;

impl SceneGraph {
    pub fn root(&self) -> &SceneNode {
        &self.nodes[ROOT.0]
    }

    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id.0)
    }

    pub fn nodes(&self) -> &[SceneNode] {
        &self.nodes
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn children(&self, id: NodeId) -> impl Iterator<Item = &SceneNode> + '_ {
        self.node(id)
            .into_iter()
            .flat_map(|n| n.children.iter())
            .filter_map(|c| self.node(*c))
    }

    pub fn shelves(&self) -> &[SceneNode] {
        &self.nodes[1..1 + self.shelf_count as usize]
    }

    pub fn products(&self) -> &[SceneNode] {
        &self.nodes[1 + self.shelf_count as usize..]
    }

    /// Product at `(shelf, column, slot)`, looked up by arena position.
    pub fn product_at(&self, shelf: u32, column: u32, slot: u32) -> Option<&SceneNode> {
        if shelf >= self.shelf_count || column >= self.columns || slot >= self.depth_count {
            return None;
        }
        let per_shelf = self.columns as usize * self.depth_count as usize;
        let offset = shelf as usize * per_shelf
            + column as usize * self.depth_count as usize
            + slot as usize;
        self.products().get(offset)
    }

    pub fn annotation(&self, kind: AnnotationKind) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.kind == kind)
    }

    /// Bounding box of every primitive.
    pub fn bounds(&self) -> Aabb {
        let mut min = [f64::INFINITY; 3];
        let mut max = [f64::NEG_INFINITY; 3];
        for node in &self.nodes {
            let node_max = node.bounds.max();
            for i in 0..3 {
                min[i] = min[i].min(node.bounds.min[i]);
                max[i] = max[i].max(node_max[i]);
            }
        }
        Aabb::new(min, [max[0] - min[0], max[1] - min[1], max[2] - min[2]])
    }

    pub fn summary(&self) -> SceneSummary {
        SceneSummary {
            primitives: self.nodes.len(),
            shelves: self.shelves().len(),
            products: self.products().len(),
            annotations: self.annotations.len(),
        }
    }
}

/// Build the scene graph for `spec`.
///
/// The caller must have passed `spec` through the math gate. Nothing here
/// re-checks the invariants.
#[instrument(skip_all, fields(
    columns = spec.layout.columns,
    depth_count = spec.layout.depth_count,
    shelves = spec.layout.shelves,
))]
pub fn build(spec: &Spec) -> SceneGraph {
    let plan = layout::solve(spec);
    let stand = &spec.stand;
    let product = &spec.product;

    let capacity = 1 + plan.shelves as usize + plan.total_capacity as usize;
    let mut nodes = Vec::with_capacity(capacity);
    nodes.push(SceneNode {
        id: ROOT,
        name: "stand".to_string(),
        kind: NodeKind::StandShell,
        bounds: Aabb::new([0.0; 3], [stand.width, stand.height, stand.depth]),
        children: Vec::new(),
    });

    for index in 0..plan.shelves {
        let id = NodeId(nodes.len());
        nodes.push(SceneNode {
            id,
            name: format!("shelf_{}", index),
            kind: NodeKind::Shelf { index },
            bounds: Aabb::new(
                [0.0, f64::from(index) * plan.tier_pitch, 0.0],
                [stand.width, stand.shelf_thickness, stand.depth],
            ),
            children: Vec::new(),
        });
        nodes[ROOT.0].children.push(id);
    }

    for shelf in 0..plan.shelves {
        let shelf_id = NodeId(1 + shelf as usize);
        for column in 0..plan.columns {
            for slot in 0..plan.depth_count {
                let id = NodeId(nodes.len());
                nodes.push(SceneNode {
                    id,
                    name: format!("product_{}_{}_{}", shelf, column, slot),
                    kind: NodeKind::Product { shelf, column, slot },
                    bounds: Aabb::new(
                        plan.slot_origin(spec, shelf, column, slot),
                        [product.width, product.height, product.depth],
                    ),
                    children: Vec::new(),
                });
                nodes[shelf_id.0].children.push(id);
            }
        }
    }

    let annotations = annotate(spec, &plan);
    debug!(primitives = nodes.len(), annotations = annotations.len(), "scene built");

    SceneGraph {
        nodes,
        annotations,
        shelf_count: plan.shelves,
        columns: plan.columns,
        depth_count: plan.depth_count,
    }
}

fn annotate(spec: &Spec, plan: &LayoutPlan) -> Vec<Annotation> {
    let m = Measurements::of(spec);
    let (w, h, d) = (spec.stand.width, spec.stand.height, spec.stand.depth);
    let product_x = plan.lateral_margin;
    let product_y = spec.stand.shelf_thickness;

    let cm = |kind, value: f64, label: &str, start, end| Annotation {
        kind,
        value,
        unit: "cm".to_string(),
        label: format!("{}: {}cm", label, value),
        start,
        end,
    };

    vec![
        cm(AnnotationKind::StandWidth, w, "Width", [0.0, 0.0, -LABEL_OFFSET], [w, 0.0, -LABEL_OFFSET]),
        cm(AnnotationKind::StandHeight, h, "Height", [-LABEL_OFFSET, 0.0, 0.0], [-LABEL_OFFSET, h, 0.0]),
        cm(AnnotationKind::StandDepth, d, "Depth", [w + LABEL_OFFSET, 0.0, 0.0], [w + LABEL_OFFSET, 0.0, d]),
        cm(
            AnnotationKind::CalculatedDepth,
            m.calculated_depth,
            "Products depth",
            [product_x, product_y, 0.0],
            [product_x, product_y, m.calculated_depth],
        ),
        cm(
            AnnotationKind::AvailableDepth,
            m.available_depth,
            "Available depth",
            [0.0, product_y, 0.0],
            [0.0, product_y, m.available_depth],
        ),
        cm(
            AnnotationKind::DepthDifference,
            m.depth_difference,
            "Depth remaining",
            [product_x, product_y, m.calculated_depth],
            [product_x, product_y, m.available_depth],
        ),
        Annotation {
            kind: AnnotationKind::TotalProducts,
            value: m.total_products as f64,
            unit: "pcs".to_string(),
            label: format!("Products: {}", m.total_products),
            start: [w / 2.0, h + LABEL_OFFSET, d / 2.0],
            end: [w / 2.0, h + LABEL_OFFSET, d / 2.0],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::fixtures::wafer_spec;

    #[test]
    fn primitive_counts() {
        let scene = build(&wafer_spec());
        let summary = scene.summary();
        assert_eq!(summary.primitives, 1 + 1 + 24);
        assert_eq!(summary.shelves, 1);
        assert_eq!(summary.products, 24);
        assert_eq!(scene.root().children.len(), 1);
        assert_eq!(scene.children(scene.shelves()[0].id).count(), 24);
    }

    #[test]
    fn shell_matches_stand() {
        let scene = build(&wafer_spec());
        assert_eq!(scene.root().kind, NodeKind::StandShell);
        assert_eq!(scene.root().bounds, Aabb::new([0.0; 3], [30.0, 30.0, 30.0]));
    }

    #[test]
    fn products_sit_on_a_regular_grid() {
        let spec = wafer_spec();
        let scene = build(&spec);
        let first = scene.product_at(0, 0, 0).unwrap();
        assert_eq!(first.bounds.min, [2.0, 2.0, 0.0]);
        assert_eq!(first.bounds.size, [13.0, 5.0, 2.5]);

        let neighbour = scene.product_at(0, 1, 0).unwrap();
        assert_eq!(neighbour.bounds.min[0], first.bounds.max()[0]);

        let last = scene.product_at(0, 1, 11).unwrap();
        assert_eq!(last.kind, NodeKind::Product { shelf: 0, column: 1, slot: 11 });
        assert_eq!(last.bounds.max()[2], 30.0);
        assert!(scene.product_at(0, 2, 0).is_none());
        assert!(scene.product_at(1, 0, 0).is_none());
    }

    #[test]
    fn every_product_is_inside_the_shell() {
        let mut spec = wafer_spec();
        spec.stand.height = 60.0;
        spec.layout.shelves = 3;
        spec.layout.depth_count = 8;
        spec.layout.gaps_depth = 0.5;
        let scene = build(&spec);
        let shell = scene.root().bounds;
        assert!(scene.products().iter().all(|p| shell.contains(&p.bounds)));
        assert_eq!(scene.bounds(), shell);
    }

    #[test]
    fn shelves_are_evenly_spaced() {
        let mut spec = wafer_spec();
        spec.stand.height = 90.0;
        spec.layout.shelves = 3;
        let scene = build(&spec);
        let ys: Vec<f64> = scene.shelves().iter().map(|s| s.bounds.min[1]).collect();
        assert_eq!(ys, vec![0.0, 30.0, 60.0]);
        let top = scene.product_at(2, 0, 0).unwrap();
        assert_eq!(top.bounds.min[1], 62.0);
    }

    #[test]
    fn annotations_carry_measurements() {
        let spec = wafer_spec();
        let scene = build(&spec);
        let m = Measurements::of(&spec);
        assert_eq!(scene.annotation(AnnotationKind::CalculatedDepth).unwrap().value, m.calculated_depth);
        assert_eq!(scene.annotation(AnnotationKind::AvailableDepth).unwrap().value, m.available_depth);
        assert_eq!(scene.annotation(AnnotationKind::DepthDifference).unwrap().value, m.depth_difference);
        assert_eq!(scene.annotation(AnnotationKind::TotalProducts).unwrap().label, "Products: 24");
    }

    #[test]
    fn scene_serializes_for_output() {
        let json = serde_json::to_value(build(&wafer_spec())).unwrap();
        assert_eq!(json["nodes"].as_array().unwrap().len(), 26);
        assert_eq!(json["shelfCount"], 1);
        assert_eq!(json["nodes"][0]["bounds"]["size"], serde_json::json!([30.0, 30.0, 30.0]));
    }

    #[test]
    fn rebuild_is_structurally_equal() {
        assert_eq!(build(&wafer_spec()), build(&wafer_spec()));
    }
}
