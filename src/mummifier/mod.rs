//! Mummifiers: the handlers that plan and materialize artifacts.
//!
//! Each variant knows how to do two things for the sources it claims:
//!
//! - **plan**: look at a source path and describe the artifact it becomes,
//!   without writing anything
//! - **mummify**: write that artifact into the target tree
//!
//! | Variant | Claims | Output |
//! |---|---|---|
//! | [`DirectoryMummifier`] | every directory | target directory, then content and children |
//! | [`PageMummifier`] | `md`, `markdown`, `html`, `htm`, `xhtml` | `.html` page |
//! | [`ImageMummifier`] | `jpg`, `jpeg`, `png`, `tif`, `tiff`, `webp` | scaled or copied image, plus aspect variants |
//! | [`OpaqueMummifier`] | anything else (when enabled) | verbatim copy |
//!
//! The [`Registry`] owns one instance of each and resolves a path to its
//! handler from the path's shape alone: directory-ness, then extension.

pub mod directory;
pub mod image;
pub mod opaque;
pub mod page;

pub use self::directory::DirectoryMummifier;
pub use self::image::ImageMummifier;
pub use self::opaque::OpaqueMummifier;
pub use self::page::PageMummifier;

use crate::artifact::{Artifact, MummifierKind};
use crate::config::SiteConfig;
use crate::context::Context;
use crate::imaging::{ImageBackend, RustBackend};
use crate::mummify::{MummifyError, MummifyScope};
use crate::naming;
use crate::planner::PlanError;
use crate::types::MediaType;
use std::path::Path;
use std::sync::Arc;

/// A strategy for one kind of artifact. Shared by every worker of a run.
pub trait Mummifier: Send + Sync {
    fn kind(&self) -> MummifierKind;

    /// Lower-case extensions this mummifier claims. Empty for mummifiers
    /// that are selected some other way.
    fn supported_extensions(&self) -> &[&'static str];

    /// The media type this mummifier would assign to `path`, if it knows.
    fn media_type_for(&self, path: &Path) -> Option<MediaType>;

    /// Describe the artifact `source_path` becomes. Writes nothing.
    fn plan(&self, context: &Context, source_path: &Path) -> Result<Artifact, PlanError>;

    /// Write `artifact` into the target tree. `context_artifact` is the
    /// directory being mummified around it; the root is its own context.
    fn mummify(
        &self,
        scope: &MummifyScope<'_>,
        context_artifact: &Artifact,
        artifact: &Artifact,
    ) -> Result<(), MummifyError>;

    fn claims_extension(&self, extension: &str) -> bool {
        self.supported_extensions().contains(&extension)
    }
}

/// The mummifiers of one run.
pub struct Registry {
    directory: DirectoryMummifier,
    page: PageMummifier,
    image: ImageMummifier,
    opaque: Option<OpaqueMummifier>,
}

impl Registry {
    /// Stock registry with the pure-Rust image backend.
    pub fn new(config: &SiteConfig) -> Self {
        Self::with_image_backend(config, Arc::new(RustBackend::new()))
    }

    pub fn with_image_backend(config: &SiteConfig, backend: Arc<dyn ImageBackend>) -> Self {
        Self {
            directory: DirectoryMummifier,
            page: PageMummifier,
            image: ImageMummifier::new(&config.images, backend),
            opaque: config.content.opaque_fallback.then_some(OpaqueMummifier),
        }
    }

    /// Resolve the mummifier for a source path: directories first, then the
    /// extension tables, then the opaque fallback when it is enabled.
    pub fn mummifier_for(&self, path: &Path) -> Option<&dyn Mummifier> {
        if path.is_dir() {
            return Some(&self.directory);
        }
        if let Some(ext) = naming::extension_of(path) {
            let claimed = [&self.page as &dyn Mummifier, &self.image]
                .into_iter()
                .find(|m| m.claims_extension(&ext));
            if claimed.is_some() {
                return claimed;
            }
        }
        self.opaque.as_ref().map(|m| m as &dyn Mummifier)
    }

    pub fn get(&self, kind: MummifierKind) -> Option<&dyn Mummifier> {
        match kind {
            MummifierKind::Directory => Some(&self.directory),
            MummifierKind::Page => Some(&self.page),
            MummifierKind::Image => Some(&self.image),
            MummifierKind::Opaque => self.opaque.as_ref().map(|m| m as &dyn Mummifier),
        }
    }

    pub fn page(&self) -> &PageMummifier {
        &self.page
    }
}
