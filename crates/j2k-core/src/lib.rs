//! # j2k-core
//!
//! Core types for the JPEG 2000 transform and bit-plane compute core.
//!
//! This crate holds the vocabulary shared by every other crate in the
//! workspace; it performs no compute itself:
//!
//! - [`Error`], [`Result`] - typed failures for every fallible operation
//! - [`FilterKernel`] - the wavelet filter catalog (5/3, 9/7, FIR banks, lifting schemes)
//! - [`SubbandSet`], [`Decomposition`] - one-level and multi-level transform output
//! - [`TileDescriptor`] - a region produced by the tiled dispatcher
//!
//! ## Crate Structure
//!
//! ```text
//! j2k-core (this crate)
//!    ^
//!    |
//!    +-- j2k-compute (DWT, bit-plane primitives, backends)
//!    +-- j2k-bench (criterion benchmarks)
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod error;
pub mod filter;
pub mod subband;
pub mod tile;

pub use error::{Error, Result};
pub use filter::{FilterKernel, FirBank, LiftingRole, LiftingScheme, LiftingStep};
pub use subband::{Decomposition, DetailLevel, SubbandSet, high_len, low_len, max_levels};
pub use tile::TileDescriptor;
