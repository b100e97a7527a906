//! Phase (b): write the planned artifact graph into the target tree.
//!
//! The driver walks the graph depth-first through each artifact's own
//! mummifier. A directory creates its target directory before anything is
//! written beneath it, mummifies its content artifact, then its children in
//! parallel. The first error stops the run; files already written by other
//! workers are left as they are.
//!
//! Progress is reported as [`MummifyEvent`]s over an optional channel so a
//! caller can print them from its own thread.

use crate::artifact::{Artifact, MummifierKind};
use crate::context::Context;
use crate::imaging::BackendError;
use crate::references::ReferenceIndex;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum MummifyError {
    #[error("{mummifier} mummifier could not write {target}: {source}")]
    Io {
        mummifier: MummifierKind,
        target: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{mummifier} mummifier: source {source_path} vanished before {target} was written")]
    SourceVanished {
        mummifier: MummifierKind,
        source_path: PathBuf,
        target: PathBuf,
    },
    #[error("{mummifier} mummifier could not process {source_path} into {target}: {error}")]
    Imaging {
        mummifier: MummifierKind,
        source_path: PathBuf,
        target: PathBuf,
        #[source]
        error: BackendError,
    },
    #[error("No {kind} mummifier registered for {target}")]
    MissingMummifier { kind: MummifierKind, target: PathBuf },
    #[error("{kind} mummifier cannot produce {target}: it has no source file")]
    PhantomUnsupported { kind: MummifierKind, target: PathBuf },
}

impl MummifyError {
    /// Map a write failure for `target`.
    pub fn write_failed(mummifier: MummifierKind, target: &Path) -> impl FnOnce(io::Error) -> Self {
        move |source| Self::Io {
            mummifier,
            target: target.to_path_buf(),
            source,
        }
    }

    /// Map a failure that involved reading `source_path`. A source that no
    /// longer exists is reported as vanished rather than as a bare I/O error.
    pub fn read_failed(
        mummifier: MummifierKind,
        source_path: &Path,
        target: &Path,
    ) -> impl FnOnce(io::Error) -> Self {
        move |source| {
            if source_path.exists() {
                Self::Io {
                    mummifier,
                    target: target.to_path_buf(),
                    source,
                }
            } else {
                Self::SourceVanished {
                    mummifier,
                    source_path: source_path.to_path_buf(),
                    target: target.to_path_buf(),
                }
            }
        }
    }
}

/// What happened to one target path.
#[derive(Debug, Clone, PartialEq)]
pub enum MummifyAction {
    /// Target directory ensured.
    Created,
    /// Source rendered into a page.
    Rendered,
    /// Page synthesized without a source file.
    Generated,
    /// Source bytes copied unchanged.
    Copied,
    /// Image re-encoded at these dimensions.
    Scaled { width: u32, height: u32 },
    /// Named image variant written.
    Variant {
        name: String,
        width: u32,
        height: u32,
    },
}

/// Progress event sent while mummifying.
#[derive(Debug, Clone, PartialEq)]
pub struct MummifyEvent {
    pub mummifier: MummifierKind,
    pub target: PathBuf,
    pub action: MummifyAction,
}

/// Everything a mummifier can consult while writing: the context, the
/// cross-reference index of the whole graph, and the event channel.
pub struct MummifyScope<'a> {
    context: &'a Context,
    references: ReferenceIndex,
    events: Option<Sender<MummifyEvent>>,
}

impl<'a> MummifyScope<'a> {
    pub fn new(context: &'a Context, root: &Artifact, events: Option<Sender<MummifyEvent>>) -> Self {
        Self {
            context,
            references: ReferenceIndex::build(root),
            events,
        }
    }

    pub fn context(&self) -> &'a Context {
        self.context
    }

    pub fn references(&self) -> &ReferenceIndex {
        &self.references
    }

    /// Mummify one artifact through the mummifier it was planned with.
    pub fn mummify(&self, context_artifact: &Artifact, artifact: &Artifact) -> Result<(), MummifyError> {
        let kind = artifact.mummifier();
        let mummifier =
            self.context
                .mummifier(kind)
                .ok_or_else(|| MummifyError::MissingMummifier {
                    kind,
                    target: artifact.target_path().to_path_buf(),
                })?;
        debug!(
            mummifier = %kind,
            target_path = %artifact.target_path().display(),
            "mummifying"
        );
        mummifier.mummify(self, context_artifact, artifact)
    }

    pub fn emit(&self, mummifier: MummifierKind, target: &Path, action: MummifyAction) {
        if let Some(tx) = &self.events {
            tx.send(MummifyEvent {
                mummifier,
                target: target.to_path_buf(),
                action,
            })
            .ok();
        }
    }
}

/// Mummify a planned graph. The root is its own context artifact.
///
/// The event sender is dropped when this returns, which ends any receiver
/// loop on the other side.
pub fn mummify(
    context: &Context,
    root: &Artifact,
    events: Option<Sender<MummifyEvent>>,
) -> Result<(), MummifyError> {
    info!(target_path = %root.target_path().display(), "mummifying artifact graph");
    let scope = MummifyScope::new(context, root, events);
    scope.mummify(root, root)?;
    info!("mummification complete");
    Ok(())
}
