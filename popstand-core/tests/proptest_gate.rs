//! Property-based tests for the math gate and geometry using `proptest`.

use proptest::prelude::*;

use popstand_core::{build, to_contract, validate, validate_with_report, BrandMeta, Contract, Layout, Product, Spec, Stand};

// ---------------------------------------------------------------------------
// Strategy helpers
// ---------------------------------------------------------------------------

fn arb_stand() -> impl Strategy<Value = Stand> {
    (1.0f64..80.0, 1.0f64..60.0, 5.0f64..120.0, 0.5f64..6.0).prop_map(
        |(width, depth, height, shelf_thickness)| Stand { width, depth, height, shelf_thickness },
    )
}

fn arb_product() -> impl Strategy<Value = Product> {
    (0.5f64..30.0, 0.5f64..60.0, 0.5f64..10.0)
        .prop_map(|(width, height, depth)| Product { width, height, depth })
}

/// Layouts including out-of-range counts, zero shelves and negative gaps.
fn arb_layout() -> impl Strategy<Value = Layout> {
    (0u32..6, 0u32..20, -1.0f64..3.0, 0u32..5).prop_map(
        |(columns, depth_count, gaps_depth, shelves)| Layout { columns, depth_count, gaps_depth, shelves },
    )
}

/// Counts anywhere in the `u32` range.
fn arb_huge_layout() -> impl Strategy<Value = Layout> {
    (any::<u32>(), any::<u32>(), 0.0f64..3.0, any::<u32>()).prop_map(
        |(columns, depth_count, gaps_depth, shelves)| Layout { columns, depth_count, gaps_depth, shelves },
    )
}

fn arb_spec() -> impl Strategy<Value = Spec> {
    (arb_stand(), arb_product(), arb_layout()).prop_map(|(s, p, l)| Spec::new(s, p, l))
}

/// Specs that pass the gate by construction: the stand is sized from the
/// product block plus non-negative slack on every axis.
fn arb_valid_spec() -> impl Strategy<Value = Spec> {
    (
        arb_product(),
        (1u32..6, 1u32..20, 0.0f64..3.0, 1u32..4),
        (0.0f64..20.0, 0.0f64..20.0, 0.0f64..20.0, 0.5f64..6.0),
    )
        .prop_map(|(product, (columns, depth_count, gaps_depth, shelves), (sw, sd, sh, shelf))| {
            let layout = Layout { columns, depth_count, gaps_depth, shelves };
            let probe = Spec::new(
                Stand { width: 0.0, depth: 0.0, height: 0.0, shelf_thickness: shelf },
                product,
                layout,
            );
            let stand = Stand {
                width: probe.total_width_needed() + sw,
                depth: probe.calculated_depth() + sd,
                height: f64::from(shelves) * (product.height + shelf + sh) + 1e-6,
                shelf_thickness: shelf,
            };
            Spec::new(stand, product, layout)
        })
}

fn holds_every_invariant(spec: &Spec) -> bool {
    let (s, p, l) = (&spec.stand, &spec.product, &spec.layout);
    let columns = f64::from(l.columns);
    let depth_count = f64::from(l.depth_count);
    l.columns >= 1
        && l.depth_count >= 1
        && l.gaps_depth >= 0.0
        && l.shelves >= 1
        && columns * p.width <= s.width
        && p.height <= s.height / f64::from(l.shelves) - s.shelf_thickness
        && depth_count * p.depth + (depth_count - 1.0) * l.gaps_depth <= s.depth
}

// ---------------------------------------------------------------------------
// 1. Validity <=> every invariant holds
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn validity_matches_invariants(spec in arb_spec()) {
        let report = validate_with_report(&spec);
        prop_assert_eq!(report.is_valid, holds_every_invariant(&spec));
        prop_assert_eq!(report.is_valid, report.errors.is_empty());
        prop_assert_eq!(validate(&spec).is_ok(), report.is_valid);
    }
}

// ---------------------------------------------------------------------------
// 1b. Any u32 counts: the gate reports, never panics
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn huge_counts_never_panic(stand in arb_stand(), product in arb_product(), layout in arb_huge_layout()) {
        let spec = Spec::new(stand, product, layout);
        let report = validate_with_report(&spec);
        prop_assert_eq!(report.is_valid, holds_every_invariant(&spec));

        let exact = u128::from(layout.columns) * u128::from(layout.depth_count) * u128::from(layout.shelves);
        let expected = u64::try_from(exact).unwrap_or(u64::MAX);
        prop_assert_eq!(report.measurements.total_products, expected);
        prop_assert_eq!(to_contract(&spec, &BrandMeta::default()).product_count, expected);
    }
}

// ---------------------------------------------------------------------------
// 2. Both entry points see the same errors
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn throwing_gate_reports_same_errors(spec in arb_spec()) {
        let report = validate_with_report(&spec);
        match validate(&spec) {
            Ok(ok) => prop_assert_eq!(ok, report),
            Err(err) => prop_assert_eq!(err.report(), &report),
        }
    }
}

// ---------------------------------------------------------------------------
// 3. Valid specs build deterministic scenes with everything inside the shell
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn valid_scenes_are_deterministic_and_contained(spec in arb_valid_spec()) {
        prop_assert!(validate_with_report(&spec).is_valid);
        let scene = build(&spec);
        prop_assert_eq!(&scene, &build(&spec));

        let expected = spec.total_products() as usize;
        prop_assert_eq!(scene.products().len(), expected);

        // Tolerate rounding in the summed slot offsets.
        let shell = scene.root().bounds;
        for product in scene.products() {
            let max = product.bounds.max();
            for i in 0..3 {
                prop_assert!(product.bounds.min[i] >= shell.min[i] - 1e-9);
                prop_assert!(max[i] <= shell.max()[i] + 1e-9);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// 4. Contract JSON round-trip keeps every dimension bit-identical
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn contract_round_trip(spec in arb_spec()) {
        let contract = to_contract(&spec, &BrandMeta::default());
        let back = Contract::from_json(&contract.to_json().unwrap()).unwrap();
        for (a, b) in contract.dimensions().iter().zip(back.dimensions().iter()) {
            prop_assert_eq!(a.to_bits(), b.to_bits());
        }
    }
}
