//! Mesh Export - Scene Graph to Interchange Text Formats
//!
//! Every primitive is a box: 8 vertices, 6 quads, 12 triangles.

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::str::FromStr;

use crate::geometry::{Aabb, SceneGraph};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Obj,
    Stl,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Obj => "obj",
            ExportFormat::Stl => "stl",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "obj" => Ok(ExportFormat::Obj),
            "stl" => Ok(ExportFormat::Stl),
            other => Err(format!("unsupported export format '{}'", other)),
        }
    }
}

// Corner indices into Aabb::corners(), wound counter-clockwise seen from
// outside: bottom, top, front, back, left, right.
const BOX_FACES: [[usize; 4]; 6] = [
    [0, 1, 2, 3],
    [4, 7, 6, 5],
    [0, 4, 5, 1],
    [3, 2, 6, 7],
    [0, 3, 7, 4],
    [1, 5, 6, 2],
];

const BOX_NORMALS: [[f64; 3]; 6] = [
    [0.0, -1.0, 0.0],
    [0.0, 1.0, 0.0],
    [0.0, 0.0, -1.0],
    [0.0, 0.0, 1.0],
    [-1.0, 0.0, 0.0],
    [1.0, 0.0, 0.0],
];

pub fn render(scene: &SceneGraph, format: ExportFormat, name: &str) -> String {
    match format {
        ExportFormat::Obj => to_obj(scene, name),
        ExportFormat::Stl => to_ascii_stl(scene, name),
    }
}

/// Wavefront OBJ with one named object per primitive and quad faces.
pub fn to_obj(scene: &SceneGraph, name: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# {}", name);
    let _ = writeln!(out, "# units: cm");

    for (i, node) in scene.nodes().iter().enumerate() {
        let base = i * 8 + 1;
        let _ = writeln!(out, "o {}", node.name);
        for [x, y, z] in node.bounds.corners() {
            let _ = writeln!(out, "v {} {} {}", x, y, z);
        }
        for face in BOX_FACES {
            let _ = writeln!(
                out,
                "f {} {} {} {}",
                base + face[0],
                base + face[1],
                base + face[2],
                base + face[3]
            );
        }
    }
    out
}

pub fn to_ascii_stl(scene: &SceneGraph, name: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "solid {}", name);
    for node in scene.nodes() {
        push_box_facets(&mut out, &node.bounds);
    }
    let _ = writeln!(out, "endsolid {}", name);
    out
}

fn push_box_facets(out: &mut String, bounds: &Aabb) {
    let corners = bounds.corners();
    for (face, n) in BOX_FACES.iter().zip(BOX_NORMALS.iter()) {
        for tri in [[face[0], face[1], face[2]], [face[0], face[2], face[3]]] {
            let _ = writeln!(out, "  facet normal {} {} {}", n[0], n[1], n[2]);
            out.push_str("    outer loop\n");
            for idx in tri {
                let [x, y, z] = corners[idx];
                let _ = writeln!(out, "      vertex {} {} {}", x, y, z);
            }
            out.push_str("    endloop\n");
            out.push_str("  endfacet\n");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::build;
    use crate::spec::fixtures::wafer_spec;

    fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
        [
            a[1] * b[2] - a[2] * b[1],
            a[2] * b[0] - a[0] * b[2],
            a[0] * b[1] - a[1] * b[0],
        ]
    }

    #[test]
    fn obj_has_eight_vertices_and_six_faces_per_primitive() {
        let scene = build(&wafer_spec());
        let obj = to_obj(&scene, "wafer");
        let n = scene.nodes().len();
        assert_eq!(obj.lines().filter(|l| l.starts_with("v ")).count(), n * 8);
        assert_eq!(obj.lines().filter(|l| l.starts_with("f ")).count(), n * 6);
        assert_eq!(obj.lines().filter(|l| l.starts_with("o ")).count(), n);
        assert!(obj.contains("o product_0_1_11"));
    }

    #[test]
    fn stl_has_twelve_facets_per_primitive() {
        let scene = build(&wafer_spec());
        let stl = to_ascii_stl(&scene, "wafer");
        assert!(stl.starts_with("solid wafer\n"));
        assert!(stl.ends_with("endsolid wafer\n"));
        assert_eq!(stl.matches("facet normal").count(), scene.nodes().len() * 12);
    }

    #[test]
    fn face_winding_matches_normals() {
        let corners = Aabb::new([0.0; 3], [1.0, 2.0, 3.0]).corners();
        for (face, n) in BOX_FACES.iter().zip(BOX_NORMALS.iter()) {
            let a = corners[face[0]];
            let b = corners[face[1]];
            let c = corners[face[2]];
            let ab = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
            let ac = [c[0] - a[0], c[1] - a[1], c[2] - a[2]];
            let got = cross(ab, ac);
            let dot = got[0] * n[0] + got[1] * n[1] + got[2] * n[2];
            assert!(dot > 0.0, "face {:?} winds against its normal", face);
        }
    }

    #[test]
    fn format_parsing() {
        assert_eq!("OBJ".parse::<ExportFormat>().unwrap(), ExportFormat::Obj);
        assert_eq!(ExportFormat::Stl.extension(), "stl");
        assert!("fbx".parse::<ExportFormat>().is_err());
    }
}
