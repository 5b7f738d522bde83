//! Partition document to validated model to case list.

use std::path::Path;

use eqclass_explore::case::InputCase;
use eqclass_explore::generator::CaseGenerator;
use eqclass_explore::sampler::{generate_cases, RandomSampler};
use eqclass_ir::parse::load_config;
use eqclass_ir::types::PartitionConfig;
use eqclass_model::model::PartitionModel;

use crate::error::HarnessError;
use crate::limits::RunLimits;

/// Build and validate a model. Validation failures carry every violation.
pub fn validated_model(config: &PartitionConfig) -> Result<PartitionModel, HarnessError> {
    let mut model = PartitionModel::from_config(config)?;
    model.validate()?;
    Ok(model)
}

/// Load a partition document from disk, enforcing the size limit first.
pub fn load_model(path: &Path, limits: &RunLimits) -> Result<PartitionModel, HarnessError> {
    let metadata = std::fs::metadata(path).map_err(|source| HarnessError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    limits.check_config_size(metadata.len())?;
    let config = load_config(path)?;
    validated_model(&config)
}

/// Deterministic cases plus optional seeded samples, bounded by `limits`.
/// An oversized sample count is rejected before any tuple is drawn.
pub fn build_cases(
    model: &PartitionModel,
    sampler: Option<&RandomSampler>,
    limits: &RunLimits,
) -> Result<Vec<InputCase>, HarnessError> {
    let generator = CaseGenerator::new(model)?;
    if let Some(sampler) = sampler {
        limits.check_cases(sampler.count)?;
    }
    let cases = generate_cases(&generator, sampler);
    limits.check_cases(cases.len())?;
    Ok(cases)
}
