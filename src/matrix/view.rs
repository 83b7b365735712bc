use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use super::traits::{Axis, MatrixData};
use crate::error::ViewResult;
use crate::math::Histogram;
use crate::meta::{DatasetDesc, IdType, ProductIdType, Value};
use crate::persist::Persisted;
use crate::range::{Range, Shape};

/// A matrix seen through a two-axis range. Holds no data.
///
/// The base is a root or a transposed root; views of views compose into a
/// single range over that base.
#[derive(Clone)]
pub struct MatrixView {
    base: Arc<dyn MatrixData>,
    range: Range,
    shape: Shape,
}

impl std::fmt::Debug for MatrixView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatrixView")
            .field("base", &self.base.desc().id)
            .field("range", &self.range.to_string())
            .field("shape", &self.shape)
            .finish()
    }
}

impl MatrixView {
    pub(crate) fn new(base: Arc<dyn MatrixData>, range: Range) -> ViewResult<Self> {
        let shape = range.size(&base.shape())?;
        Ok(Self { base, range, shape })
    }

    pub fn base(&self) -> &Arc<dyn MatrixData> {
        &self.base
    }

    /// Effective range in base coordinates.
    pub fn range(&self) -> &Range {
        &self.range
    }

    fn compose(&self, range: &Range) -> ViewResult<Range> {
        self.range.pre_multiply(range, &self.base.shape())
    }
}

#[async_trait]
impl MatrixData for MatrixView {
    fn desc(&self) -> &DatasetDesc {
        self.base.desc()
    }

    fn shape(&self) -> Shape {
        self.shape.clone()
    }

    fn rowtype(&self) -> Arc<IdType> {
        self.base.rowtype()
    }

    fn coltype(&self) -> Arc<IdType> {
        self.base.coltype()
    }

    fn producttype(&self) -> Arc<ProductIdType> {
        self.base.producttype()
    }

    async fn rows(&self, range: &Range) -> ViewResult<Vec<String>> {
        self.base.rows(&self.compose(range)?).await
    }

    async fn row_ids(&self, range: &Range) -> ViewResult<Range> {
        self.base.row_ids(&self.compose(range)?).await
    }

    async fn cols(&self, range: &Range) -> ViewResult<Vec<String>> {
        self.base.cols(&self.compose(range)?).await
    }

    async fn col_ids(&self, range: &Range) -> ViewResult<Range> {
        self.base.col_ids(&self.compose(range)?).await
    }

    async fn ids(&self, range: &Range) -> ViewResult<Range> {
        self.base.ids(&self.compose(range)?).await
    }

    async fn data(&self, range: &Range) -> ViewResult<Vec<Vec<Value>>> {
        self.base.data(&self.compose(range)?).await
    }

    async fn at(&self, row: usize, col: usize) -> ViewResult<Value> {
        let extent = self.base.shape();
        let row = self.range.dim_or_all(0).at(row, extent[0])?;
        let col = self.range.dim_or_all(1).at(col, extent[1])?;
        self.base.at(row, col).await
    }

    fn t(&self) -> Arc<dyn MatrixData> {
        let mut shape = self.shape.clone();
        shape.swap(0, 1);
        Arc::new(MatrixView {
            base: self.base.t(),
            range: self.range.swap(),
            shape,
        })
    }

    fn view(&self, range: &Range) -> ViewResult<MatrixView> {
        MatrixView::new(self.base.clone(), self.compose(range)?)
    }

    fn persist(&self) -> Persisted {
        Persisted::view(self.base.persist(), &self.range)
    }

    fn heatmap_url(&self, range: &Range, options: &JsonValue) -> Option<String> {
        let composed = self.compose(range).ok()?;
        self.base.heatmap_url(&composed, options)
    }

    async fn hist(
        &self,
        bins: Option<usize>,
        range: &Range,
        contained: Axis,
    ) -> ViewResult<Option<Histogram>> {
        self.base.hist(bins, &self.compose(range)?, contained).await
    }
}
