//! Stand Pipeline - Single Entry Point
//!
//! CRITICAL: compile and build_scene MUST pass the math gate first. No bypass.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::contract::{to_contract, Contract, ContractError};
use crate::export::{self, ExportFormat};
use crate::geometry::{self, SceneGraph, SceneSummary};
use crate::hashing::{compute_job_hash, compute_manifest_hash, sha256_hex, spec_fingerprint};
use crate::layout::{self, LayoutPlan};
use crate::normalize::{normalize, NormalizeError, Normalized, RawForm};
use crate::profiles::{ProductProfile, ProfileRegistry, StandType};
use crate::provenance::Provenance;
use crate::spec::Spec;
use crate::validation::{ValidationError, ValidationResult, Validator};
use crate::{CONTRACT_SCHEMA_VERSION, ENGINE_VERSION};

#[cfg(feature = "test-hooks")]
use std::sync::atomic::{AtomicU32, Ordering};

#[cfg(feature = "test-hooks")]
static GATE_CALL_COUNT: AtomicU32 = AtomicU32::new(0);

#[cfg(feature = "test-hooks")]
pub fn get_gate_call_count() -> u32 {
    GATE_CALL_COUNT.load(Ordering::SeqCst)
}

#[cfg(feature = "test-hooks")]
pub fn reset_gate_call_count() {
    GATE_CALL_COUNT.store(0, Ordering::SeqCst);
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Normalization failed: {0}")]
    Normalize(#[from] NormalizeError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Request requires engine >= {0}, current is {1}")]
    EngineVersionMismatch(String, String),

    #[error("Invalid version: {0}")]
    InvalidVersion(String),

    #[error(transparent)]
    Contract(#[from] ContractError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

fn default_exports() -> Vec<ExportFormat> {
    vec![ExportFormat::Obj]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileRequest {
    pub form: RawForm,
    #[serde(default)]
    pub engine_min_version: Option<String>,
    #[serde(default = "default_exports")]
    pub exports: Vec<ExportFormat>,
}

impl CompileRequest {
    pub fn new(form: RawForm) -> Self {
        Self {
            form,
            engine_min_version: None,
            exports: default_exports(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedFile {
    pub filename: String,
    pub format: ExportFormat,
    pub data_base64: String,
    pub hash: String,
}

/// Normalized form plus its non-throwing gate report.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckedForm {
    pub normalized: Normalized,
    pub validation: ValidationResult,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledStand {
    pub id: String,
    pub engine_version: String,
    pub schema_version: String,
    pub created_at: DateTime<Utc>,
    pub spec_hash: String,
    pub job_hash: String,
    pub manifest_hash: String,
    pub stand_type: StandType,
    pub product_profile: String,
    pub provenance: Provenance,
    pub spec: Spec,
    pub validation: ValidationResult,
    pub layout: LayoutPlan,
    pub contract: Contract,
    pub contract_hash: String,
    pub scene: SceneSummary,
    pub exports: Vec<ExportedFile>,
}

/// The stand pipeline - single entry point for callers outside the core
pub struct StandPipeline {
    registry: ProfileRegistry,
    config: EngineConfig,
    validator: Validator,
}

impl StandPipeline {
    pub fn new(registry: ProfileRegistry, config: EngineConfig) -> Self {
        let validator = Validator::with_thresholds(config.thresholds);
        Self { registry, config, validator }
    }

    pub fn list_profiles(&self) -> Vec<&ProductProfile> {
        self.registry.list()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn normalize(&self, form: &RawForm) -> Result<Normalized, PipelineError> {
        Ok(normalize(form, &self.config.defaults, &self.registry)?)
    }

    /// Run the math gate, failing on any fatal condition.
    ///
    /// This is the ONLY gate entry point used by build and compile.
    pub fn validate_spec(&self, spec: &Spec) -> Result<ValidationResult, PipelineError> {
        #[cfg(feature = "test-hooks")]
        GATE_CALL_COUNT.fetch_add(1, Ordering::SeqCst);

        Ok(self.validator.validate(spec)?)
    }

    /// Report-only gate: never fails on an invalid Spec.
    pub fn report(&self, spec: &Spec) -> ValidationResult {
        self.validator.validate_with_report(spec)
    }

    /// Normalize a form and report on it without rejecting.
    pub fn check(&self, form: &RawForm) -> Result<CheckedForm, PipelineError> {
        let normalized = self.normalize(form)?;
        let validation = self.report(&normalized.spec);
        Ok(CheckedForm { normalized, validation })
    }

    /// Gate then build. An invalid Spec never reaches the geometry builder.
    pub fn build_scene(&self, spec: &Spec) -> Result<SceneGraph, PipelineError> {
        self.validate_spec(spec)?;
        Ok(geometry::build(spec))
    }

    /// Compile a form into a manifest.
    ///
    /// CRITICAL: This ALWAYS calls validate_spec before geometry. No bypass possible.
    #[instrument(skip_all)]
    pub fn compile(&self, request: &CompileRequest) -> Result<CompiledStand, PipelineError> {
        if let Some(min) = &request.engine_min_version {
            check_engine_version(min)?;
        }

        let normalized = self.normalize(&request.form)?;
        let spec = normalized.spec;

        // MANDATORY: the gate runs on every compile.
        let validation = self.validate_spec(&spec)?;

        let layout = layout::solve(&spec);
        let scene = geometry::build(&spec);
        let contract = to_contract(&spec, &normalized.brand);
        let contract_hash = contract.fingerprint()?;

        let name = export_name(&normalized);
        let exports = request
            .exports
            .iter()
            .map(|format| {
                let data = export::render(&scene, *format, &name);
                ExportedFile {
                    filename: format!("{}.{}", name, format.extension()),
                    format: *format,
                    hash: sha256_hex(data.as_bytes()),
                    data_base64: base64::Engine::encode(
                        &base64::engine::general_purpose::STANDARD,
                        data.as_bytes(),
                    ),
                }
            })
            .collect();

        let spec_hash = spec_fingerprint(&spec)?;
        let job_hash = compute_job_hash(&spec_hash, &normalized.brand, ENGINE_VERSION)?;

        let mut compiled = CompiledStand {
            id: Uuid::new_v4().to_string(),
            engine_version: ENGINE_VERSION.to_string(),
            schema_version: CONTRACT_SCHEMA_VERSION.to_string(),
            created_at: Utc::now(),
            spec_hash,
            job_hash,
            manifest_hash: String::new(), // Computed after
            stand_type: normalized.stand_type,
            product_profile: normalized.product_profile,
            provenance: normalized.provenance,
            spec,
            validation,
            layout,
            contract,
            contract_hash,
            scene: scene.summary(),
            exports,
        };
        compiled.manifest_hash = compute_manifest_hash(&compiled)?;

        info!(
            id = %compiled.id,
            products = compiled.contract.product_count,
            warnings = compiled.validation.warnings.len(),
            "stand compiled"
        );
        Ok(compiled)
    }
}

impl Default for StandPipeline {
    fn default() -> Self {
        Self::new(ProfileRegistry::default(), EngineConfig::default())
    }
}

fn check_engine_version(min: &str) -> Result<(), PipelineError> {
    let engine_ver = semver::Version::parse(ENGINE_VERSION)
        .map_err(|_| PipelineError::InvalidVersion(ENGINE_VERSION.to_string()))?;
    let min_ver = semver::Version::parse(min)
        .map_err(|_| PipelineError::InvalidVersion(min.to_string()))?;

    if engine_ver < min_ver {
        return Err(PipelineError::EngineVersionMismatch(
            min.to_string(),
            ENGINE_VERSION.to_string(),
        ));
    }
    Ok(())
}

fn export_name(normalized: &Normalized) -> String {
    let slug: String = normalized
        .brand
        .product
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    let slug = slug.trim_matches('_');
    if slug.is_empty() {
        "stand".to_string()
    } else {
        format!("{}_stand", slug)
    }
}
