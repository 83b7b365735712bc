//! Lazy range algebra and composable views over vector and matrix datasets.
//!
//! A [`Range`] selects positions along one or more axes. Views are a root
//! dataset plus a range in root coordinates, so views of views never
//! chain: every access composes once and reaches the loader behind the
//! root. Views persist to small JSON documents ([`Persisted`]) that a
//! [`DatasetRegistry`] turns back into live views.

pub mod backend;
pub mod config;
pub mod error;
pub mod math;
pub mod matrix;
pub mod meta;
pub mod persist;
pub mod range;
pub mod store;
pub mod vector;

pub use config::Config;
pub use error::{ViewError, ViewResult};
pub use matrix::{Axis, Matrix, MatrixData, MatrixView, TableOptions, TransposedMatrix};
pub use meta::{DataKind, DatasetDesc, Value, ValueTypeDesc};
pub use persist::Persisted;
pub use range::{CompositeRange1D, Range, Range1D};
pub use store::{DatasetRegistry, DescriptionStore, MemoryDescriptionStore};
pub use vector::{Stratification, StratificationGroup, Vector, VectorData, VectorExt, VectorView};
