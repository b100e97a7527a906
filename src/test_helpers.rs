//! Shared test utilities for the mummy test suite.
//!
//! Provides temp-dir contexts, source tree builders, and artifact lookups
//! that panic with the available names on a miss.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! let ctx = context_for(&tmp);
//! write_tree(ctx.source_root(), &[("blog/post1.md", "# One")]);
//! let root = planner::plan(&ctx).unwrap();
//!
//! let blog = find_child(&root, "blog");
//! assert_eq!(child_names(blog), vec!["post1.md"]);
//! ```

use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

use crate::artifact::Artifact;
use crate::config::SiteConfig;
use crate::context::Context;
use crate::imaging::backend::tests::MockBackend;
use crate::mummifier::Registry;
use crate::naming;

// =========================================================================
// Contexts
// =========================================================================

/// Context over `<tmp>/site` → `<tmp>/dist` with the stock configuration.
///
/// Neither root is created; [`write_tree`] creates the source side as needed.
pub fn context_for(tmp: &TempDir) -> Context {
    context_with(tmp, SiteConfig::default())
}

pub fn context_with(tmp: &TempDir, config: SiteConfig) -> Context {
    Context::new(tmp.path().join("site"), tmp.path().join("dist"), config).unwrap()
}

/// Context whose image mummifier uses the given mock backend.
pub fn context_with_backend(
    tmp: &TempDir,
    config: SiteConfig,
    backend: Arc<MockBackend>,
) -> Context {
    let registry = Registry::with_image_backend(&config, backend);
    Context::with_registry(
        tmp.path().join("site"),
        tmp.path().join("dist"),
        config,
        registry,
    )
    .unwrap()
}

// =========================================================================
// Source tree builders
// =========================================================================

/// Write a file, creating its parent directories.
pub fn write_file(path: &Path, contents: impl AsRef<[u8]>) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, contents).unwrap();
}

/// Write `(relative path, contents)` pairs under `root`. A path ending in
/// `/` creates an empty directory.
pub fn write_tree(root: &Path, entries: &[(&str, &str)]) {
    std::fs::create_dir_all(root).unwrap();
    for (relative, contents) in entries {
        if let Some(dir) = relative.strip_suffix('/') {
            std::fs::create_dir_all(root.join(dir)).unwrap();
        } else {
            write_file(&root.join(relative), contents);
        }
    }
}

/// Encode a small real JPEG of the given size.
pub fn write_jpeg(path: &Path, width: u32, height: u32) {
    use image::codecs::jpeg::JpegEncoder;
    use image::{ImageBuffer, Rgb};

    let img = ImageBuffer::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    });
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    let file = std::fs::File::create(path).unwrap();
    JpegEncoder::new_with_quality(file, 90)
        .encode_image(&img)
        .unwrap();
}

// =========================================================================
// Artifact lookups: panics with a clear message on miss
// =========================================================================

/// Source file names of a directory artifact's children, in planned order.
pub fn child_names(artifact: &Artifact) -> Vec<String> {
    artifact
        .child_artifacts()
        .iter()
        .map(|c| naming::file_name(c.source_path()))
        .collect()
}

/// Find a child by source file name. Panics if not found.
pub fn find_child<'a>(artifact: &'a Artifact, name: &str) -> &'a Artifact {
    artifact
        .child_artifacts()
        .iter()
        .find(|c| naming::file_name(c.source_path()) == name)
        .unwrap_or_else(|| {
            let names = child_names(artifact);
            panic!("child '{name}' not found. Available: {names:?}")
        })
}
