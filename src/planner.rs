//! Phase (a): plan the whole source tree into an artifact graph.
//!
//! Planning decides everything that will be produced before anything is
//! written, so later steps (cross-reference resolution, listing pages) can
//! see the complete graph. Each path is handed to the mummifier the
//! registry picks for it; the directory mummifier recurses back through
//! [`plan_path`] for its entries.
//!
//! Once the graph is built, every target path (image variants included) is
//! checked for uniqueness.

use crate::artifact::{Artifact, MummifierKind};
use crate::context::Context;
use crate::description::{self, DescriptionError, PropertyValue, ResourceDescription};
use crate::imaging::BackendError;
use crate::naming;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum PlanError {
    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Source not found: {0}")]
    SourceNotFound(PathBuf),
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("{path} is outside the source root {root}")]
    OutsideSourceRoot { path: PathBuf, root: PathBuf },
    #[error("No mummifier for {0} (opaque fallback is disabled)")]
    NoMummifier(PathBuf),
    #[error("Invalid metadata for {path}: {source}")]
    Description {
        path: PathBuf,
        #[source]
        source: DescriptionError,
    },
    #[error("{mummifier} mummifier cannot read {path}: {source}")]
    Imaging {
        mummifier: MummifierKind,
        path: PathBuf,
        #[source]
        source: BackendError,
    },
    #[error("Target {target} would be written by both {first} and {second}")]
    TargetCollision {
        target: PathBuf,
        first: PathBuf,
        second: PathBuf,
    },
}

impl PlanError {
    pub fn io(path: &Path) -> impl FnOnce(io::Error) -> Self {
        move |source| Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Plan the context's whole source tree.
pub fn plan(context: &Context) -> Result<Artifact, PlanError> {
    let root = context.source_root();
    if !root.exists() {
        return Err(PlanError::SourceNotFound(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(PlanError::NotADirectory(root.to_path_buf()));
    }

    info!(source = %root.display(), "planning");
    let artifact = plan_path(context, root)?;
    verify_targets(&artifact)?;
    info!(artifacts = artifact.walk().count(), "planning complete");
    Ok(artifact)
}

/// Plan one path through the mummifier the registry picks for it.
pub fn plan_path(context: &Context, path: &Path) -> Result<Artifact, PlanError> {
    let mummifier = context
        .mummifier_for_path(path)
        .ok_or_else(|| PlanError::NoMummifier(path.to_path_buf()))?;
    let artifact = mummifier.plan(context, path)?;
    debug!(
        mummifier = %artifact.mummifier(),
        source = %path.display(),
        target_path = %artifact.target_path().display(),
        "planned"
    );
    Ok(artifact)
}

/// Fail on the first target path claimed by two artifacts.
pub fn verify_targets(root: &Artifact) -> Result<(), PlanError> {
    let mut seen: HashMap<&Path, &Path> = HashMap::new();
    for artifact in root.walk() {
        for target in artifact.target_paths() {
            if let Some(first) = seen.insert(target, artifact.source_path()) {
                return Err(PlanError::TargetCollision {
                    target: target.to_path_buf(),
                    first: first.to_path_buf(),
                    second: artifact.source_path().to_path_buf(),
                });
            }
        }
    }
    Ok(())
}

/// Mirror `source` into the target tree, optionally with a new extension.
pub(crate) fn target_path(
    context: &Context,
    source: &Path,
    extension: Option<&str>,
) -> Result<PathBuf, PlanError> {
    context
        .target_path_for(source, extension)
        .ok_or_else(|| PlanError::OutsideSourceRoot {
            path: source.to_path_buf(),
            root: context.source_root().to_path_buf(),
        })
}

/// The sidecar description of `source`, empty when there is none.
pub(crate) fn sidecar_description(
    context: &Context,
    source: &Path,
) -> Result<ResourceDescription, PlanError> {
    description::load_sidecar(source, context.properties()).map_err(|source_err| {
        PlanError::Description {
            path: source.to_path_buf(),
            source: source_err,
        }
    })
}

/// Fill `title` and `order` from the `NNN-name` convention where nothing
/// better set them. `name` is a file stem or a directory name.
pub(crate) fn apply_name_defaults(description: &mut ResourceDescription, name: &str) {
    let entry = naming::parse_entry_name(name);
    description.set_if_absent(description::TITLE, PropertyValue::Text(entry.title));
    if let Some(order) = entry.order {
        description.set_if_absent(description::ORDER, PropertyValue::Integer(order.into()));
    }
}
