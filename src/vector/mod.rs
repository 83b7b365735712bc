//! One-dimensional datasets: roots, views and stratifications.

mod root;
mod stratification;
mod traits;
mod view;

pub use root::Vector;
pub use stratification::{GroupDesc, Stratification, StratificationGroup};
pub use traits::{VectorData, VectorExt};
pub use view::VectorView;
