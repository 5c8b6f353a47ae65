//! Manufacturing Contract - Flat Projection of a Spec
//!
//! Field names and units are a cross-stage wire contract. Do not rename.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::hashing::compute_manifest_hash;
use crate::spec::{BrandMeta, Material, Spec};
use crate::CONTRACT_SCHEMA_VERSION;

#[derive(Debug, Error)]
pub enum ContractError {
    #[error("Invalid contract JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid schema version '{0}'")]
    InvalidSchemaVersion(String),

    #[error("Contract schema {found} is not compatible with engine schema {supported}")]
    IncompatibleSchema { found: String, supported: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contract {
    pub stand_width: f64,
    pub stand_depth: f64,
    pub stand_height: f64,
    pub shelf_thickness: f64,
    pub shelf_count: u32,
    pub product_width: f64,
    pub product_height: f64,
    pub product_depth: f64,
    pub product_count: u64,
    pub brand: String,
    pub product: String,
    pub material: Material,
}

/// Project a Spec and its brand metadata into a contract.
///
/// No validation happens here; consumers reject invalid contracts with the
/// same invariants the gate uses.
pub fn to_contract(spec: &Spec, brand: &BrandMeta) -> Contract {
    Contract {
        stand_width: spec.stand.width,
        stand_depth: spec.stand.depth,
        stand_height: spec.stand.height,
        shelf_thickness: spec.stand.shelf_thickness,
        shelf_count: spec.layout.shelves,
        product_width: spec.product.width,
        product_height: spec.product.height,
        product_depth: spec.product.depth,
        product_count: spec.total_products(),
        brand: brand.brand.clone(),
        product: brand.product.clone(),
        material: brand.material,
    }
}

impl Contract {
    pub fn to_json(&self) -> Result<String, ContractError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, ContractError> {
        Ok(serde_json::from_str(json)?)
    }

    /// SHA-256 over the canonical (sorted-key) JSON form.
    pub fn fingerprint(&self) -> Result<String, ContractError> {
        Ok(compute_manifest_hash(self)?)
    }

    /// Numeric fields in wire order.
    pub fn dimensions(&self) -> [f64; 9] {
        [
            self.stand_width,
            self.stand_depth,
            self.stand_height,
            self.shelf_thickness,
            f64::from(self.shelf_count),
            self.product_width,
            self.product_height,
            self.product_depth,
            self.product_count as f64,
        ]
    }
}

/// Check that a contract written under `version` can be read by this engine:
/// same major version, and not newer than what the engine writes.
pub fn check_schema(version: &str) -> Result<(), ContractError> {
    let found = semver::Version::parse(version)
        .map_err(|_| ContractError::InvalidSchemaVersion(version.to_string()))?;
    let supported = semver::Version::parse(CONTRACT_SCHEMA_VERSION)
        .map_err(|_| ContractError::InvalidSchemaVersion(CONTRACT_SCHEMA_VERSION.to_string()))?;

    if found.major != supported.major || found > supported {
        return Err(ContractError::IncompatibleSchema {
            found: version.to_string(),
            supported: CONTRACT_SCHEMA_VERSION.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::fixtures::wafer_spec;

    fn brand() -> BrandMeta {
        BrandMeta {
            brand: "Crunchy Co".to_string(),
            product: "Hazelnut Wafer".to_string(),
            material: Material::Cardboard,
        }
    }

    #[test]
    fn projection_copies_dimensions() {
        let contract = to_contract(&wafer_spec(), &brand());
        assert_eq!(contract.stand_width, 30.0);
        assert_eq!(contract.shelf_thickness, 2.0);
        assert_eq!(contract.shelf_count, 1);
        assert_eq!(contract.product_depth, 2.5);
        assert_eq!(contract.product_count, 24);
        assert_eq!(contract.brand, "Crunchy Co");
    }

    #[test]
    fn wire_field_names_are_stable() {
        let json = serde_json::to_value(to_contract(&wafer_spec(), &brand())).unwrap();
        let mut keys: Vec<_> = json.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        assert_eq!(
            keys,
            vec![
                "brand", "material", "product", "productCount", "productDepth", "productHeight",
                "productWidth", "shelfCount", "shelfThickness", "standDepth", "standHeight",
                "standWidth",
            ]
        );
        assert_eq!(json["material"], "cardboard");
    }

    #[test]
    fn fingerprint_is_stable() {
        let contract = to_contract(&wafer_spec(), &brand());
        assert_eq!(contract.fingerprint().unwrap(), contract.clone().fingerprint().unwrap());
        let mut other = contract.clone();
        other.stand_width = 31.0;
        assert_ne!(contract.fingerprint().unwrap(), other.fingerprint().unwrap());
    }

    #[test]
    fn schema_compatibility() {
        assert!(check_schema(CONTRACT_SCHEMA_VERSION).is_ok());
        assert!(check_schema("1.0.0").is_ok());
        assert!(matches!(check_schema("2.0.0"), Err(ContractError::IncompatibleSchema { .. })));
        assert!(matches!(check_schema("banana"), Err(ContractError::InvalidSchemaVersion(_))));
    }
}
