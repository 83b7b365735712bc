//! Loader traits: the narrow seam between views and data transport.
//!
//! Every call receives the dataset description and a range that is fully
//! composed against the root extent. Implementations must be safe to call
//! concurrently for different ranges.

use async_trait::async_trait;
use futures::try_join;
use serde_json::Value as JsonValue;

use crate::error::ViewResult;
use crate::math::Histogram;
use crate::meta::{DatasetDesc, Value};
use crate::range::{self, Range, Range1D};

/// Data access for one-dimensional datasets.
#[async_trait]
pub trait VectorLoader: Send + Sync {
    /// Row names.
    async fn rows(&self, desc: &DatasetDesc, range: &Range) -> ViewResult<Vec<String>>;

    /// Row identifiers, as an explicit range.
    async fn ids(&self, desc: &DatasetDesc, range: &Range) -> ViewResult<Range>;

    async fn data(&self, desc: &DatasetDesc, range: &Range) -> ViewResult<Vec<Value>>;
}

/// Data access for two-dimensional datasets.
#[async_trait]
pub trait MatrixLoader: Send + Sync {
    async fn rows(&self, desc: &DatasetDesc, range: &Range) -> ViewResult<Vec<String>>;

    async fn row_ids(&self, desc: &DatasetDesc, range: &Range) -> ViewResult<Range>;

    async fn cols(&self, desc: &DatasetDesc, range: &Range) -> ViewResult<Vec<String>>;

    async fn col_ids(&self, desc: &DatasetDesc, range: &Range) -> ViewResult<Range>;

    /// Row-major cells selected by `range`.
    async fn data(&self, desc: &DatasetDesc, range: &Range) -> ViewResult<Vec<Vec<Value>>>;

    /// Two-axis identifier range `(row ids, col ids)`.
    async fn ids(&self, desc: &DatasetDesc, range: &Range) -> ViewResult<Range> {
        let rows = Range::from(range.dim_or_all(0).clone());
        let cols = Range::from(range.dim_or_all(1).clone());
        let (row_ids, col_ids) =
            try_join!(self.row_ids(desc, &rows), self.col_ids(desc, &cols))?;
        Ok(range::join(&row_ids, &col_ids))
    }

    /// Single cell; the default selects a 1×1 window through [`Self::data`].
    async fn at(&self, desc: &DatasetDesc, row: usize, col: usize) -> ViewResult<Value> {
        let window = Range::new([Range1D::list([row]), Range1D::list([col])]);
        let data = self.data(desc, &window).await?;
        Ok(data
            .into_iter()
            .next()
            .and_then(|r| r.into_iter().next())
            .unwrap_or(Value::Missing))
    }

    /// Optional fast paths offered by this loader.
    fn capabilities(&self) -> MatrixLoaderCapabilities<'_> {
        MatrixLoaderCapabilities::default()
    }
}

/// Server-side histogram computation.
#[async_trait]
pub trait NumericalHistLoader: Send + Sync {
    async fn numerical_hist(
        &self,
        desc: &DatasetDesc,
        range: &Range,
        bins: usize,
    ) -> ViewResult<Histogram>;
}

/// Rendered heatmap location for a window of a matrix.
pub trait HeatmapUrlLoader: Send + Sync {
    fn heatmap_url(&self, desc: &DatasetDesc, range: &Range, options: &JsonValue) -> String;
}

/// Optional capabilities of a matrix loader. Callers check slot presence.
#[derive(Default, Clone, Copy)]
pub struct MatrixLoaderCapabilities<'a> {
    pub numerical_hist: Option<&'a dyn NumericalHistLoader>,
    pub heatmap_url: Option<&'a dyn HeatmapUrlLoader>,
}

impl std::fmt::Debug for MatrixLoaderCapabilities<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatrixLoaderCapabilities")
            .field("numerical_hist", &self.numerical_hist.is_some())
            .field("heatmap_url", &self.heatmap_url.is_some())
            .finish()
    }
}

#[async_trait]
impl<T: VectorLoader + ?Sized> VectorLoader for std::sync::Arc<T> {
    async fn rows(&self, desc: &DatasetDesc, range: &Range) -> ViewResult<Vec<String>> {
        (**self).rows(desc, range).await
    }

    async fn ids(&self, desc: &DatasetDesc, range: &Range) -> ViewResult<Range> {
        (**self).ids(desc, range).await
    }

    async fn data(&self, desc: &DatasetDesc, range: &Range) -> ViewResult<Vec<Value>> {
        (**self).data(desc, range).await
    }
}

#[async_trait]
impl<T: MatrixLoader + ?Sized> MatrixLoader for std::sync::Arc<T> {
    async fn rows(&self, desc: &DatasetDesc, range: &Range) -> ViewResult<Vec<String>> {
        (**self).rows(desc, range).await
    }

    async fn row_ids(&self, desc: &DatasetDesc, range: &Range) -> ViewResult<Range> {
        (**self).row_ids(desc, range).await
    }

    async fn cols(&self, desc: &DatasetDesc, range: &Range) -> ViewResult<Vec<String>> {
        (**self).cols(desc, range).await
    }

    async fn col_ids(&self, desc: &DatasetDesc, range: &Range) -> ViewResult<Range> {
        (**self).col_ids(desc, range).await
    }

    async fn data(&self, desc: &DatasetDesc, range: &Range) -> ViewResult<Vec<Vec<Value>>> {
        (**self).data(desc, range).await
    }

    async fn ids(&self, desc: &DatasetDesc, range: &Range) -> ViewResult<Range> {
        (**self).ids(desc, range).await
    }

    async fn at(&self, desc: &DatasetDesc, row: usize, col: usize) -> ViewResult<Value> {
        (**self).at(desc, row, col).await
    }

    fn capabilities(&self) -> MatrixLoaderCapabilities<'_> {
        (**self).capabilities()
    }
}
