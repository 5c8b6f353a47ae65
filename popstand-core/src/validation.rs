//! Validation Gate - Math Gates Before Geometry
//!
//! Rules produce findings; the gate collects every finding in one pass and
//! sorts them into fatal errors and advisory warnings. Geometry may only be
//! built from a Spec whose report has no errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::spec::Spec;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Fatal,
    Warning,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Finding {
    pub rule: &'static str,
    pub severity: Severity,
    pub message: String,
}

impl Finding {
    fn fatal(rule: &'static str, message: String) -> Self {
        Self { rule, severity: Severity::Fatal, message: format!("{}: {}", rule, message) }
    }

    fn warning(rule: &'static str, message: String) -> Self {
        Self { rule, severity: Severity::Warning, message: format!("{}: {}", rule, message) }
    }
}

/// Needed-versus-available numbers, populated even when the Spec is invalid.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Measurements {
    pub calculated_depth: f64,
    pub available_depth: f64,
    /// Available minus calculated; negative on overflow.
    pub depth_difference: f64,
    pub total_products: u64,
}

impl Measurements {
    pub fn of(spec: &Spec) -> Self {
        let calculated_depth = spec.calculated_depth();
        let available_depth = spec.stand.depth;
        Self {
            calculated_depth,
            available_depth,
            depth_difference: available_depth - calculated_depth,
            total_products: spec.total_products(),
        }
    }

    /// Share of the available depth in use, 0 when the stand has no depth.
    pub fn depth_utilization(&self) -> f64 {
        if self.available_depth > 0.0 {
            self.calculated_depth / self.available_depth
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub measurements: Measurements,
}

impl ValidationResult {
    fn from_findings(findings: Vec<Finding>, measurements: Measurements) -> Self {
        let (errors, warnings): (Vec<_>, Vec<_>) = findings
            .into_iter()
            .partition(|f| f.severity == Severity::Fatal);
        Self {
            is_valid: errors.is_empty(),
            errors: errors.into_iter().map(|f| f.message).collect(),
            warnings: warnings.into_iter().map(|f| f.message).collect(),
            measurements,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Validation failed: {}", .messages.join("; "))]
    Rejected {
        messages: Vec<String>,
        report: ValidationResult,
    },
}

impl ValidationError {
    pub fn report(&self) -> &ValidationResult {
        match self {
            ValidationError::Rejected { report, .. } => report,
        }
    }
}

/// Warning thresholds for the advisory rules.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Thresholds {
    /// Warn when used depth falls below this share of the stand depth.
    #[serde(default = "default_underutilization")]
    pub underutilization_ratio: f64,
    /// Warn when lateral clearance is at least 0 and below this (cm).
    #[serde(default = "default_tight_fit")]
    pub tight_fit_cm: f64,
    /// Warn when shelves are thinner than this (cm).
    #[serde(default = "default_thin_shelf")]
    pub thin_shelf_cm: f64,
}

pub const DEFAULT_UNDERUTILIZATION_RATIO: f64 = 0.30;
pub const DEFAULT_TIGHT_FIT_CM: f64 = 1.0;
pub const DEFAULT_THIN_SHELF_CM: f64 = 1.5;

fn default_underutilization() -> f64 { DEFAULT_UNDERUTILIZATION_RATIO }
fn default_tight_fit() -> f64 { DEFAULT_TIGHT_FIT_CM }
fn default_thin_shelf() -> f64 { DEFAULT_THIN_SHELF_CM }

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            underutilization_ratio: DEFAULT_UNDERUTILIZATION_RATIO,
            tight_fit_cm: DEFAULT_TIGHT_FIT_CM,
            thin_shelf_cm: DEFAULT_THIN_SHELF_CM,
        }
    }
}

/// Gate rule trait - one invariant or advisory check
pub trait GateRule: Send + Sync {
    fn name(&self) -> &'static str;
    fn check(&self, spec: &Spec, thresholds: &Thresholds) -> Option<Finding>;
}

// --- Fatal Rules ---

pub struct DepthOverflowRule;

impl GateRule for DepthOverflowRule {
    fn name(&self) -> &'static str { "DEPTH OVERFLOW" }

    fn check(&self, spec: &Spec, _: &Thresholds) -> Option<Finding> {
        let needed = spec.calculated_depth();
        let available = spec.stand.depth;
        (needed > available).then(|| {
            Finding::fatal(
                self.name(),
                format!(
                    "{} x {}cm products + {} x {}cm gaps = {}cm exceeds stand depth {}cm by {}cm",
                    spec.layout.depth_count,
                    spec.product.depth,
                    spec.layout.depth_count.saturating_sub(1),
                    spec.layout.gaps_depth,
                    needed,
                    available,
                    needed - available
                ),
            )
        })
    }
}

pub struct WidthOverflowRule;

impl GateRule for WidthOverflowRule {
    fn name(&self) -> &'static str { "WIDTH OVERFLOW" }

    fn check(&self, spec: &Spec, _: &Thresholds) -> Option<Finding> {
        let needed = spec.total_width_needed();
        (needed > spec.stand.width).then(|| {
            Finding::fatal(
                self.name(),
                format!(
                    "{} columns x {}cm = {}cm exceeds stand width {}cm",
                    spec.layout.columns, spec.product.width, needed, spec.stand.width
                ),
            )
        })
    }
}

pub struct HeightOverflowRule;

impl GateRule for HeightOverflowRule {
    fn name(&self) -> &'static str { "HEIGHT OVERFLOW" }

    fn check(&self, spec: &Spec, _: &Thresholds) -> Option<Finding> {
        let available = spec.tier_clearance();
        (spec.product.height > available).then(|| {
            Finding::fatal(
                self.name(),
                format!(
                    "product height {}cm exceeds available {}cm per tier (stand {}cm / {} tiers - {}cm shelf)",
                    spec.product.height,
                    available,
                    spec.stand.height,
                    spec.layout.shelves.max(1),
                    spec.stand.shelf_thickness
                ),
            )
        })
    }
}

pub struct ColumnsRule;

impl GateRule for ColumnsRule {
    fn name(&self) -> &'static str { "LAYOUT ERROR" }

    fn check(&self, spec: &Spec, _: &Thresholds) -> Option<Finding> {
        (spec.layout.columns < 1).then(|| {
            Finding::fatal(self.name(), format!("columns must be at least 1, got {}", spec.layout.columns))
        })
    }
}

pub struct DepthCountRule;

impl GateRule for DepthCountRule {
    fn name(&self) -> &'static str { "COUNT ERROR" }

    fn check(&self, spec: &Spec, _: &Thresholds) -> Option<Finding> {
        (spec.layout.depth_count < 1).then(|| {
            Finding::fatal(
                self.name(),
                format!("depth count must be at least 1, got {}", spec.layout.depth_count),
            )
        })
    }
}

pub struct GapsRule;

impl GateRule for GapsRule {
    fn name(&self) -> &'static str { "GAPS ERROR" }

    fn check(&self, spec: &Spec, _: &Thresholds) -> Option<Finding> {
        (spec.layout.gaps_depth < 0.0).then(|| {
            Finding::fatal(
                self.name(),
                format!("depth gaps must not be negative, got {}cm", spec.layout.gaps_depth),
            )
        })
    }
}

pub struct ShelvesRule;

impl GateRule for ShelvesRule {
    fn name(&self) -> &'static str { "SHELF ERROR" }

    fn check(&self, spec: &Spec, _: &Thresholds) -> Option<Finding> {
        (spec.layout.shelves < 1).then(|| {
            Finding::fatal(self.name(), format!("shelf count must be at least 1, got {}", spec.layout.shelves))
        })
    }
}

// --- Advisory Rules ---

pub struct DepthUtilizationRule;

impl GateRule for DepthUtilizationRule {
    fn name(&self) -> &'static str { "DEPTH UNDERUTILIZATION" }

    fn check(&self, spec: &Spec, thresholds: &Thresholds) -> Option<Finding> {
        if spec.layout.depth_count < 1 {
            return None;
        }
        let m = Measurements::of(spec);
        let limit = thresholds.underutilization_ratio * m.available_depth;
        (m.calculated_depth < limit).then(|| {
            Finding::warning(
                self.name(),
                format!(
                    "only {}cm of {}cm depth used ({:.1}%, below {:.0}%)",
                    m.calculated_depth,
                    m.available_depth,
                    m.depth_utilization() * 100.0,
                    thresholds.underutilization_ratio * 100.0
                ),
            )
        })
    }
}

pub struct TightWidthRule;

impl GateRule for TightWidthRule {
    fn name(&self) -> &'static str { "TIGHT WIDTH FIT" }

    fn check(&self, spec: &Spec, thresholds: &Thresholds) -> Option<Finding> {
        if spec.layout.columns < 1 {
            return None;
        }
        let clearance = spec.stand.width - spec.total_width_needed();
        (clearance >= 0.0 && clearance < thresholds.tight_fit_cm).then(|| {
            Finding::warning(
                self.name(),
                format!(
                    "only {}cm lateral clearance (under {}cm)",
                    clearance, thresholds.tight_fit_cm
                ),
            )
        })
    }
}

pub struct ThinShelfRule;

impl GateRule for ThinShelfRule {
    fn name(&self) -> &'static str { "THIN SHELF" }

    fn check(&self, spec: &Spec, thresholds: &Thresholds) -> Option<Finding> {
        (spec.stand.shelf_thickness < thresholds.thin_shelf_cm).then(|| {
            Finding::warning(
                self.name(),
                format!(
                    "shelf thickness {}cm is under {}cm",
                    spec.stand.shelf_thickness, thresholds.thin_shelf_cm
                ),
            )
        })
    }
}

/// Validator orchestrates the rules; fatal rules run before advisory ones
pub struct Validator {
    rules: Vec<Box<dyn GateRule>>,
    thresholds: Thresholds,
}

impl Validator {
    pub fn new() -> Self {
        Self::with_thresholds(Thresholds::default())
    }

    pub fn with_thresholds(thresholds: Thresholds) -> Self {
        Self {
            rules: vec![
                Box::new(DepthOverflowRule),
                Box::new(WidthOverflowRule),
                Box::new(HeightOverflowRule),
                Box::new(ColumnsRule),
                Box::new(DepthCountRule),
                Box::new(GapsRule),
                Box::new(ShelvesRule),
                Box::new(DepthUtilizationRule),
                Box::new(TightWidthRule),
                Box::new(ThinShelfRule),
            ],
            thresholds,
        }
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Runs every rule. Never short-circuits.
    #[instrument(skip_all)]
    pub fn evaluate(&self, spec: &Spec) -> ValidationResult {
        let findings: Vec<Finding> = self
            .rules
            .iter()
            .filter_map(|rule| rule.check(spec, &self.thresholds))
            .collect();
        let result = ValidationResult::from_findings(findings, Measurements::of(spec));
        info!(
            valid = result.is_valid,
            errors = result.errors.len(),
            warnings = result.warnings.len(),
            calculated_depth = result.measurements.calculated_depth,
            available_depth = result.measurements.available_depth,
            "math gate evaluated"
        );
        result
    }

    /// Fails with every fatal message when any hard invariant is violated.
    pub fn validate(&self, spec: &Spec) -> Result<ValidationResult, ValidationError> {
        let report = self.evaluate(spec);
        if report.is_valid {
            Ok(report)
        } else {
            warn!(errors = ?report.errors, "spec rejected by math gate");
            Err(ValidationError::Rejected {
                messages: report.errors.clone(),
                report,
            })
        }
    }

    /// Same rules as [`Validator::validate`], failure encoded in the report.
    pub fn validate_with_report(&self, spec: &Spec) -> ValidationResult {
        self.evaluate(spec)
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate with default thresholds, failing on any fatal condition.
pub fn validate(spec: &Spec) -> Result<ValidationResult, ValidationError> {
    Validator::new().validate(spec)
}

/// Validate with default thresholds, never failing.
pub fn validate_with_report(spec: &Spec) -> ValidationResult {
    Validator::new().validate_with_report(spec)
}
