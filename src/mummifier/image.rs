//! Image mummifier.
//!
//! Plan time asks the backend for the image's dimensions and records them as
//! `image:width` / `image:height`. Mummify time decides per image:
//!
//! - sources at or below `images.scale_threshold` bytes are copied as they are
//! - larger sources are re-encoded with the longer edge limited to
//!   `images.max_length`, at `images.quality`
//!
//! Each configured aspect adds a variant `<stem>-<aspect>.<ext>` beside the
//! main target, always re-encoded at the aspect's size.

use super::Mummifier;
use crate::artifact::{Artifact, ArtifactSource, ArtifactVariant, MummifierKind};
use crate::config::ImagesConfig;
use crate::context::Context;
use crate::description::{self, PropertyValue};
use crate::imaging::{
    self, BackendError, Dimensions, ImageBackend, Quality, ScaleConfig, ScaleDecision,
};
use crate::mummify::{MummifyAction, MummifyError, MummifyScope};
use crate::naming;
use crate::planner::{self, PlanError};
use crate::types::MediaType;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;

pub const WIDTH: &str = "image:width";
pub const HEIGHT: &str = "image:height";

pub struct ImageMummifier {
    scale: ScaleConfig,
    /// Aspect name → (max length, quality).
    aspects: BTreeMap<String, (u32, Quality)>,
    backend: Arc<dyn ImageBackend>,
}

impl ImageMummifier {
    pub fn new(config: &ImagesConfig, backend: Arc<dyn ImageBackend>) -> Self {
        let quality = Quality::new(config.quality);
        let aspects = config
            .aspects
            .iter()
            .map(|(name, aspect)| {
                let q = aspect.quality.map_or(quality, Quality::new);
                (name.clone(), (aspect.max_length, q))
            })
            .collect();
        Self {
            scale: ScaleConfig {
                threshold: config.scale_threshold,
                max_length: config.max_length,
                quality,
            },
            aspects,
            backend,
        }
    }

    /// Dimensions recorded at plan time, else a fresh identify.
    fn dimensions(&self, artifact: &Artifact) -> Result<Dimensions, MummifyError> {
        let recorded = |key: &str| {
            artifact
                .description()
                .get(key)
                .and_then(PropertyValue::as_integer)
                .and_then(|v| u32::try_from(v).ok())
        };
        if let (Some(width), Some(height)) = (recorded(WIDTH), recorded(HEIGHT)) {
            return Ok(Dimensions { width, height });
        }
        let source = artifact.source_path();
        self.backend
            .identify(source)
            .map_err(imaging_failed(source, artifact.target_path()))
    }
}

/// `photo.jpg` + `thumb` → `photo-thumb.jpg`, next to the main target.
fn variant_path(target: &Path, aspect: &str) -> PathBuf {
    let name = naming::file_name(target);
    let file_name = match naming::split_name(&name) {
        (stem, Some(ext)) => format!("{stem}-{aspect}.{ext}"),
        (stem, None) => format!("{stem}-{aspect}"),
    };
    target.with_file_name(file_name)
}

fn imaging_failed(source: &Path, target: &Path) -> impl FnOnce(BackendError) -> MummifyError {
    move |error| {
        if source.exists() {
            MummifyError::Imaging {
                mummifier: MummifierKind::Image,
                source_path: source.to_path_buf(),
                target: target.to_path_buf(),
                error,
            }
        } else {
            MummifyError::SourceVanished {
                mummifier: MummifierKind::Image,
                source_path: source.to_path_buf(),
                target: target.to_path_buf(),
            }
        }
    }
}

impl Mummifier for ImageMummifier {
    fn kind(&self) -> MummifierKind {
        MummifierKind::Image
    }

    fn supported_extensions(&self) -> &[&'static str] {
        imaging::supported_input_extensions()
    }

    fn media_type_for(&self, path: &Path) -> Option<MediaType> {
        naming::extension_of(path)
            .filter(|ext| self.claims_extension(ext))
            .and_then(|ext| MediaType::for_extension(&ext))
    }

    fn plan(&self, context: &Context, source_path: &Path) -> Result<Artifact, PlanError> {
        let dims = self
            .backend
            .identify(source_path)
            .map_err(|source| PlanError::Imaging {
                mummifier: MummifierKind::Image,
                path: source_path.to_path_buf(),
                source,
            })?;

        let mut description = planner::sidecar_description(context, source_path)?;
        description.set(WIDTH, PropertyValue::Integer(dims.width.into()));
        description.set(HEIGHT, PropertyValue::Integer(dims.height.into()));
        planner::apply_name_defaults(&mut description, &naming::stem_of(source_path));
        if let Some(media_type) = self.media_type_for(source_path) {
            description.set_if_absent(description::CONTENT_TYPE, PropertyValue::MediaType(media_type));
        }

        let target = planner::target_path(context, source_path, None)?;
        let variants = self
            .aspects
            .keys()
            .map(|name| ArtifactVariant {
                name: name.clone(),
                target_path: variant_path(&target, name),
            })
            .collect();
        Ok(Artifact::file(
            ArtifactSource::Real(source_path.to_path_buf()),
            target,
            MummifierKind::Image,
            description,
        )
        .with_variants(variants))
    }

    fn mummify(
        &self,
        scope: &MummifyScope<'_>,
        _context_artifact: &Artifact,
        artifact: &Artifact,
    ) -> Result<(), MummifyError> {
        let target = artifact.target_path();
        if artifact.is_phantom() {
            return Err(MummifyError::PhantomUnsupported {
                kind: MummifierKind::Image,
                target: target.to_path_buf(),
            });
        }
        let source = artifact.source_path();
        let size = fs::metadata(source)
            .map_err(MummifyError::read_failed(MummifierKind::Image, source, target))?
            .len();
        let original = self.dimensions(artifact)?;

        let decision = imaging::plan_scale(source, target, size, original, &self.scale);
        imaging::execute(self.backend.as_ref(), &decision)
            .map_err(imaging_failed(source, target))?;
        let action = match &decision {
            ScaleDecision::Copy { .. } => MummifyAction::Copied,
            ScaleDecision::Scale(params) => MummifyAction::Scaled {
                width: params.width,
                height: params.height,
            },
        };
        scope.emit(MummifierKind::Image, target, action);

        for variant in artifact.variants() {
            let Some(&(max_length, quality)) = self.aspects.get(&variant.name) else {
                warn!(aspect = %variant.name, target_path = %target.display(), "unknown aspect, skipped");
                continue;
            };
            let params =
                imaging::plan_variant(source, &variant.target_path, original, max_length, quality);
            self.backend
                .scale(&params)
                .map_err(imaging_failed(source, &variant.target_path))?;
            scope.emit(
                MummifierKind::Image,
                &variant.target_path,
                MummifyAction::Variant {
                    name: variant.name.clone(),
                    width: params.width,
                    height: params.height,
                },
            );
        }
        Ok(())
    }
}
