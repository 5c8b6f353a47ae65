//! PopStand Core - Parametric Display-Stand Geometry Engine
//!
//! # The Rules (Non-Negotiable)
//! 1. Geometry Is Truth
//! 2. Gates Before Geometry
//! 3. Every Violation In One Pass
//! 4. Deterministic Output
//! 5. Contracts Are Projections
//! 6. Pure Core, No Shared State

pub mod config;
pub mod contract;
pub mod export;
pub mod geometry;
pub mod hashing;
pub mod layout;
pub mod normalize;
pub mod pipeline;
pub mod profiles;
pub mod provenance;
pub mod spec;
pub mod validation;

pub use config::{ConfigError, EngineConfig};
pub use contract::{check_schema, to_contract, Contract, ContractError};
pub use export::ExportFormat;
pub use geometry::{build, Aabb, Annotation, AnnotationKind, NodeId, NodeKind, SceneGraph, SceneNode};
pub use hashing::{canonical_json, compute_manifest_hash, spec_fingerprint};
pub use layout::{solve, LayoutPlan};
pub use normalize::{normalize, NormalizeError, Normalized, NormalizerDefaults, RawForm, RawValue};
pub use pipeline::{CompileRequest, CompiledStand, PipelineError, StandPipeline};
pub use profiles::{ProductProfile, ProfileRegistry, StandType};
pub use provenance::{Provenance, ValueSource};
pub use spec::{BrandMeta, Layout, Material, Product, Spec, Stand};
pub use validation::{
    validate, validate_with_report, Measurements, Thresholds, ValidationError, ValidationResult, Validator,
};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const CONTRACT_SCHEMA_VERSION: &str = "1.0.0";
