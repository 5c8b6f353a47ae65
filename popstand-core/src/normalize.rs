//! Spec Normalizer - Raw Form to Canonical Spec
//!
//! Forms arrive with optional fields, mixed units and free-text enumerations.
//! Normalization converts every length to centimeters and fills gaps from the
//! stand-type defaults and the selected product profile. Layout counts are
//! never derived from geometry: they come from the form or default to 1.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::profiles::{ProfileRegistry, StandType, REFERENCE_PROFILE};
use crate::provenance::{Provenance, ValueSource};
use crate::spec::{BrandMeta, Layout, Material, Product, Spec, Stand};

#[derive(Debug, Error, PartialEq)]
pub enum NormalizeError {
    #[error("Invalid length for {field}: '{value}'")]
    InvalidLength { field: &'static str, value: String },

    #[error("Unknown unit '{unit}' for {field}")]
    UnknownUnit { field: &'static str, unit: String },

    #[error("Invalid count for {field}: '{value}' (expected a whole number >= 0)")]
    InvalidCount { field: &'static str, value: String },

    #[error("Unknown stand type: {0}")]
    UnknownStandType(String),

    #[error("Unknown product category: {0}")]
    UnknownProductCategory(String),

    #[error("Unknown material: {0}")]
    UnknownMaterial(String),
}

/// A form value: either a JSON number or free text such as `"30cm"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Text(String),
}

impl RawValue {
    fn describe(&self) -> String {
        match self {
            RawValue::Number(n) => n.to_string(),
            RawValue::Text(s) => s.clone(),
        }
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Number(value)
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

/// Loosely-typed form input. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawForm {
    /// Unit for bare numbers; centimeters when absent.
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub stand_type: Option<String>,
    #[serde(default)]
    pub product_category: Option<String>,

    #[serde(default)]
    pub stand_width: Option<RawValue>,
    #[serde(default)]
    pub stand_depth: Option<RawValue>,
    #[serde(default)]
    pub stand_height: Option<RawValue>,
    #[serde(default)]
    pub shelf_thickness: Option<RawValue>,

    #[serde(default)]
    pub product_width: Option<RawValue>,
    #[serde(default)]
    pub product_height: Option<RawValue>,
    #[serde(default)]
    pub product_depth: Option<RawValue>,

    #[serde(default)]
    pub columns: Option<RawValue>,
    #[serde(default)]
    pub depth_count: Option<RawValue>,
    #[serde(default)]
    pub gaps_depth: Option<RawValue>,
    #[serde(default)]
    pub shelves: Option<RawValue>,

    #[serde(default)]
    pub brand_name: Option<String>,
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default)]
    pub material: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthUnit {
    Mm,
    Cm,
    M,
    In,
}

impl LengthUnit {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mm" | "millimeter" | "millimeters" | "millimetre" | "millimetres" => Some(LengthUnit::Mm),
            "" | "cm" | "centimeter" | "centimeters" | "centimetre" | "centimetres" => Some(LengthUnit::Cm),
            "m" | "meter" | "meters" | "metre" | "metres" => Some(LengthUnit::M),
            "in" | "inch" | "inches" | "\"" => Some(LengthUnit::In),
            _ => None,
        }
    }

    pub fn to_cm(&self, value: f64) -> f64 {
        match self {
            LengthUnit::Mm => value / 10.0,
            LengthUnit::Cm => value,
            LengthUnit::M => value * 100.0,
            LengthUnit::In => value * 2.54,
        }
    }
}

/// Defaults applied when the form leaves a field empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizerDefaults {
    #[serde(default)]
    pub stand_type: StandType,
    #[serde(default = "default_profile")]
    pub product_profile: String,
    #[serde(default)]
    pub material: Material,
}

fn default_profile() -> String { REFERENCE_PROFILE.to_string() }

impl Default for NormalizerDefaults {
    fn default() -> Self {
        Self {
            stand_type: StandType::default(),
            product_profile: default_profile(),
            material: Material::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Normalized {
    pub spec: Spec,
    pub brand: BrandMeta,
    pub stand_type: StandType,
    pub product_profile: String,
    pub provenance: Provenance,
}

/// Convert raw form data into a fully-populated Spec.
#[instrument(skip_all, fields(stand_type = ?form.stand_type, category = ?form.product_category))]
pub fn normalize(
    form: &RawForm,
    defaults: &NormalizerDefaults,
    registry: &ProfileRegistry,
) -> Result<Normalized, NormalizeError> {
    let unit = match non_empty(form.unit.as_deref()) {
        Some(u) => LengthUnit::parse(u).ok_or_else(|| NormalizeError::UnknownUnit {
            field: "unit",
            unit: u.to_string(),
        })?,
        None => LengthUnit::Cm,
    };

    let stand_type = match non_empty(form.stand_type.as_deref()) {
        Some(s) => s.parse::<StandType>().map_err(|_| NormalizeError::UnknownStandType(s.to_string()))?,
        None => defaults.stand_type,
    };
    let fallback_stand = stand_type.defaults();

    let profile_id = non_empty(form.product_category.as_deref())
        .unwrap_or(defaults.product_profile.as_str());
    let profile = registry
        .get(profile_id)
        .ok_or_else(|| NormalizeError::UnknownProductCategory(profile_id.to_string()))?;
    let fallback_product = profile.product();

    let mut provenance = Provenance::new();
    let mut length = |field: &'static str,
                      raw: &Option<RawValue>,
                      fallback: f64,
                      source: ValueSource|
     -> Result<f64, NormalizeError> {
        match parse_dimension(field, raw.as_ref(), unit)? {
            Some(value) => {
                provenance.record(field, ValueSource::Form);
                Ok(value)
            }
            None => {
                provenance.record(field, source);
                Ok(fallback)
            }
        }
    };

    let stand = Stand {
        width: length("stand.width", &form.stand_width, fallback_stand.width, ValueSource::Profile)?,
        depth: length("stand.depth", &form.stand_depth, fallback_stand.depth, ValueSource::Profile)?,
        height: length("stand.height", &form.stand_height, fallback_stand.height, ValueSource::Profile)?,
        shelf_thickness: length(
            "stand.shelfThickness",
            &form.shelf_thickness,
            fallback_stand.shelf_thickness,
            ValueSource::Profile,
        )?,
    };
    let product = Product {
        width: length("product.width", &form.product_width, fallback_product.width, ValueSource::Profile)?,
        height: length("product.height", &form.product_height, fallback_product.height, ValueSource::Profile)?,
        depth: length("product.depth", &form.product_depth, fallback_product.depth, ValueSource::Profile)?,
    };

    // Negative gaps are left for the gate to report.
    let gaps_depth = match parse_length("layout.gapsDepth", form.gaps_depth.as_ref(), unit)? {
        Some(value) => {
            provenance.record("layout.gapsDepth", ValueSource::Form);
            value
        }
        None => {
            provenance.record("layout.gapsDepth", ValueSource::System);
            0.0
        }
    };

    let mut count = |field: &'static str,
                     raw: &Option<RawValue>,
                     fallback: u32,
                     source: ValueSource|
     -> Result<u32, NormalizeError> {
        match parse_count(field, raw.as_ref())? {
            Some(value) => {
                provenance.record(field, ValueSource::Form);
                Ok(value)
            }
            None => {
                provenance.record(field, source);
                Ok(fallback)
            }
        }
    };
    let layout = Layout {
        columns: count("layout.columns", &form.columns, 1, ValueSource::System)?,
        depth_count: count("layout.depthCount", &form.depth_count, 1, ValueSource::System)?,
        gaps_depth,
        shelves: count("layout.shelves", &form.shelves, 1, ValueSource::System)?,
    };

    let material = match non_empty(form.material.as_deref()) {
        Some(m) => m.parse::<Material>().map_err(|_| NormalizeError::UnknownMaterial(m.to_string()))?,
        None => defaults.material,
    };
    let brand = BrandMeta {
        brand: non_empty(form.brand_name.as_deref()).unwrap_or_default().to_string(),
        product: non_empty(form.product_name.as_deref())
            .unwrap_or(profile.name.as_str())
            .to_string(),
        material,
    };

    let spec = Spec::new(stand, product, layout);
    debug!(
        ?stand_type,
        profile = %profile.id,
        defaulted = provenance.defaulted().len(),
        "normalized form"
    );

    Ok(Normalized {
        spec,
        brand,
        stand_type,
        product_profile: profile.id.clone(),
        provenance,
    })
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// Parse a length in `default_unit` (or its own suffix) into centimeters.
/// Empty text counts as absent.
pub fn parse_length(
    field: &'static str,
    raw: Option<&RawValue>,
    default_unit: LengthUnit,
) -> Result<Option<f64>, NormalizeError> {
    let invalid = |raw: &RawValue| NormalizeError::InvalidLength { field, value: raw.describe() };
    let Some(raw) = raw else {
        return Ok(None);
    };
    let cm = match raw {
        RawValue::Number(n) => default_unit.to_cm(*n),
        RawValue::Text(text) => {
            let text = text.trim();
            if text.is_empty() {
                return Ok(None);
            }
            let split = text
                .find(|c: char| !(c.is_ascii_digit() || matches!(c, '.' | ',' | '-' | '+')))
                .unwrap_or(text.len());
            let (number, suffix) = text.split_at(split);
            let value: f64 = number.trim().replace(',', ".").parse().map_err(|_| invalid(raw))?;
            let unit = if suffix.trim().is_empty() {
                default_unit
            } else {
                LengthUnit::parse(suffix).ok_or_else(|| NormalizeError::UnknownUnit {
                    field,
                    unit: suffix.trim().to_string(),
                })?
            };
            unit.to_cm(value)
        }
    };
    if !cm.is_finite() {
        return Err(invalid(raw));
    }
    Ok(Some(cm))
}

/// Parse a stand or product dimension; zero and negative lengths are errors.
pub fn parse_dimension(
    field: &'static str,
    raw: Option<&RawValue>,
    default_unit: LengthUnit,
) -> Result<Option<f64>, NormalizeError> {
    let value = parse_length(field, raw, default_unit)?;
    match (value, raw) {
        (Some(cm), Some(raw)) if cm <= 0.0 => Err(NormalizeError::InvalidLength {
            field,
            value: raw.describe(),
        }),
        _ => Ok(value),
    }
}

/// Parse a whole, non-negative count. Empty text counts as absent.
pub fn parse_count(field: &'static str, raw: Option<&RawValue>) -> Result<Option<u32>, NormalizeError> {
    let invalid = |raw: &RawValue| NormalizeError::InvalidCount { field, value: raw.describe() };
    let Some(raw) = raw else {
        return Ok(None);
    };
    let value = match raw {
        RawValue::Number(n) => *n,
        RawValue::Text(text) => {
            let text = text.trim();
            if text.is_empty() {
                return Ok(None);
            }
            text.parse::<f64>().map_err(|_| invalid(raw))?
        }
    };
    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 || value > f64::from(u32::MAX) {
        return Err(invalid(raw));
    }
    Ok(Some(value as u32))
}
