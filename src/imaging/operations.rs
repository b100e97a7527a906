//! High-level image operations.
//!
//! These functions combine calculations with backend execution. Planning is
//! pure: it takes the file size and dimensions already known from the plan
//! phase and returns a [`ScaleDecision`]; [`execute`] carries it out.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::calculations::calculate_scaled_dimensions;
use super::params::{Quality, ScaleParams};
use std::path::{Path, PathBuf};

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Scaling settings for the main image of an artifact.
#[derive(Debug, Clone)]
pub struct ScaleConfig {
    /// Sources at or below this many bytes are copied verbatim.
    pub threshold: u64,
    /// Longest edge after scaling.
    pub max_length: u32,
    pub quality: Quality,
}

/// What to do with one image output.
#[derive(Debug, Clone, PartialEq)]
pub enum ScaleDecision {
    /// Copy the source bytes unchanged.
    Copy {
        source: PathBuf,
        output: PathBuf,
    },
    /// Re-encode through the backend.
    Scale(ScaleParams),
}

/// Decide whether the main image needs re-encoding.
///
/// Only sources larger than the threshold are touched; those are limited to
/// `max_length` on the longer edge (never upscaled) and re-encoded at the
/// configured quality.
pub fn plan_scale(
    source: &Path,
    output: &Path,
    file_size: u64,
    original: Dimensions,
    config: &ScaleConfig,
) -> ScaleDecision {
    if file_size <= config.threshold {
        return ScaleDecision::Copy {
            source: source.to_path_buf(),
            output: output.to_path_buf(),
        };
    }
    let (width, height) = calculate_scaled_dimensions(original.as_tuple(), config.max_length);
    ScaleDecision::Scale(ScaleParams {
        source: source.to_path_buf(),
        output: output.to_path_buf(),
        width,
        height,
        quality: config.quality,
    })
}

/// Plan a named variant. Variants are always re-encoded, whatever the size.
pub fn plan_variant(
    source: &Path,
    output: &Path,
    original: Dimensions,
    max_length: u32,
    quality: Quality,
) -> ScaleParams {
    let (width, height) = calculate_scaled_dimensions(original.as_tuple(), max_length);
    ScaleParams {
        source: source.to_path_buf(),
        output: output.to_path_buf(),
        width,
        height,
        quality,
    }
}

/// Carry out a decision.
pub fn execute(backend: &dyn ImageBackend, decision: &ScaleDecision) -> Result<()> {
    match decision {
        ScaleDecision::Copy { source, output } => {
            std::fs::copy(source, output)?;
            Ok(())
        }
        ScaleDecision::Scale(params) => backend.scale(params),
    }
}
