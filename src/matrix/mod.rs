//! Two-dimensional datasets: roots, views and transposes.

mod root;
mod table;
mod traits;
mod transposed;
mod view;

pub use root::Matrix;
pub use table::TableOptions;
pub use traits::{Axis, MatrixData};
pub use transposed::TransposedMatrix;
pub use view::MatrixView;
