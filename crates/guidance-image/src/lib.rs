#![deny(missing_docs)]
//! Image types and basic operations for single-channel float images

/// image representation for filtering purposes.
pub mod image;

/// Error types for the image module.
pub mod error;

/// operations on whole images.
pub mod ops;

pub use crate::error::ImageError;
pub use crate::image::{Image, ImageSize};
