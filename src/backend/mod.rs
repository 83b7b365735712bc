//! Data access behind views.
//!
//! This module provides:
//! - [`VectorLoader`] and [`MatrixLoader`], the loader contracts
//! - [`MatrixLoaderCapabilities`], optional loader fast paths
//! - [`CachingLoader`], payload memoization keyed by dataset id
//! - [`MemoryLoader`], loaders over in-memory payloads
//! - [`IdAssigner`] and [`LocalIdAssigner`] for ad-hoc tables

mod assign;
mod caching;
mod memory;
mod traits;

pub use assign::{IdAssigner, LocalIdAssigner};
pub use caching::{CachingLoader, PayloadSource};
pub use memory::{MatrixPayload, MemoryLoader, VectorPayload};
pub use traits::{
    HeatmapUrlLoader, MatrixLoader, MatrixLoaderCapabilities, NumericalHistLoader,
    VectorLoader,
};
