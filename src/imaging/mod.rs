//! Image processing: pure Rust, no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::image_dimensions` |
//! | **Scale** | Lanczos3 resize, re-encoded in the source format |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: Scale-or-copy decisions and their execution

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::calculate_scaled_dimensions;
pub use operations::{ScaleConfig, ScaleDecision, execute, plan_scale, plan_variant};
pub use params::{Quality, ScaleParams};
pub use rust_backend::{RustBackend, supported_input_extensions};
