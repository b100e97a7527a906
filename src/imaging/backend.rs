//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the two operations the image
//! mummifier needs: identify (plan time) and scale (mummify time).
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the pure-Rust
//! `image` crate.

use super::params::ScaleParams;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn as_tuple(self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Trait for image processing backends.
///
/// Shared by every worker of a run, so implementations must be thread-safe.
pub trait ImageBackend: Send + Sync {
    /// Get image dimensions without decoding pixels where possible.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Resize the source to exactly the requested dimensions and encode it
    /// to the output path.
    fn scale(&self, params: &ScaleParams) -> Result<(), BackendError>;
}
