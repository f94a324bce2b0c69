//! Error types for the transform and bit-plane core.
//!
//! Every fallible operation in the workspace returns [`Result`]. Errors are
//! raised before any compute starts, so a failed call never leaves a
//! caller-owned buffer partially transformed.
//!
//! # Categories
//!
//! - [`Parameter`](Error::Parameter) - malformed shapes, sizes or filter taps
//! - [`UnsupportedFeature`](Error::UnsupportedFeature) - backend or filter path unavailable here
//! - [`Internal`](Error::Internal) - failure reported by the GPU kernel provider
//! - [`NotImplemented`](Error::NotImplemented) - reserved operation, with the supported alternative
//!
//! # Usage
//!
//! ```rust
//! use j2k_core::{Error, Result};
//!
//! fn check_tile(len: usize, width: usize, height: usize) -> Result<()> {
//!     if len != width * height {
//!         return Err(Error::parameter(format!(
//!             "buffer length {len} does not match {width}x{height}"
//!         )));
//!     }
//!     Ok(())
//! }
//!
//! assert!(check_tile(16, 4, 4).is_ok());
//! assert!(check_tile(15, 4, 4).unwrap_err().is_parameter());
//! ```

use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the compute core.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Malformed shape or size input.
    ///
    /// Buffer length not equal to `width * height`, zero image dimensions,
    /// empty filter taps, zero lifting scale factors, or an empty level list
    /// handed to an inverse transform.
    #[error("invalid parameter: {0}")]
    Parameter(String),

    /// The requested backend or filter path is not available.
    ///
    /// Raised when GPU execution is forced on a host without a kernel
    /// provider, or when a filter cannot run on the requested path (for
    /// example a floating-point filter on integer samples).
    #[error("unsupported feature: {0}")]
    UnsupportedFeature(String),

    /// Lower-level failure inside the GPU kernel provider.
    ///
    /// Always carries the provider's diagnostic text.
    #[error("internal error: {0}")]
    Internal(String),

    /// Operation reserved for a later release.
    #[error("{feature} is not implemented yet; use {alternative} instead")]
    NotImplemented {
        /// What was requested
        feature: String,
        /// Currently supported way to get the same result
        alternative: String,
    },
}

impl Error {
    /// Creates a [`Error::Parameter`].
    pub fn parameter(msg: impl Into<String>) -> Self {
        Self::Parameter(msg.into())
    }

    /// Creates a [`Error::UnsupportedFeature`].
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::UnsupportedFeature(msg.into())
    }

    /// Creates a [`Error::Internal`].
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Creates a [`Error::NotImplemented`].
    pub fn not_implemented(feature: impl Into<String>, alternative: impl Into<String>) -> Self {
        Self::NotImplemented {
            feature: feature.into(),
            alternative: alternative.into(),
        }
    }

    /// True for [`Error::Parameter`].
    pub fn is_parameter(&self) -> bool {
        matches!(self, Self::Parameter(_))
    }

    /// True for [`Error::UnsupportedFeature`].
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::UnsupportedFeature(_))
    }
}

/// Validates that a sample buffer holds exactly `width * height` samples.
pub fn check_buffer_len(len: usize, width: usize, height: usize) -> Result<()> {
    let expected = width
        .checked_mul(height)
        .ok_or_else(|| Error::parameter(format!("dimensions {width}x{height} overflow")))?;
    if len != expected {
        return Err(Error::parameter(format!(
            "buffer length {len} does not match {width}x{height} = {expected}"
        )));
    }
    Ok(())
}
