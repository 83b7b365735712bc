use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use super::root::Matrix;
use super::traits::{transpose, Axis, MatrixData};
use super::view::MatrixView;
use crate::error::ViewResult;
use crate::math::Histogram;
use crate::meta::{DatasetDesc, IdType, ProductIdType, Value};
use crate::persist::Persisted;
use crate::range::{Range, Shape};

/// A root matrix with rows and columns exchanged.
///
/// Every range passed in is swapped before it reaches the root, and
/// results are swapped back.
#[derive(Debug, Clone)]
pub struct TransposedMatrix {
    root: Matrix,
    producttype: Arc<ProductIdType>,
}

impl TransposedMatrix {
    pub fn new(root: Matrix) -> Self {
        let producttype = Arc::new(ProductIdType::new(root.coltype(), root.rowtype()));
        Self { root, producttype }
    }

    pub fn root(&self) -> &Matrix {
        &self.root
    }
}

#[async_trait]
impl MatrixData for TransposedMatrix {
    fn desc(&self) -> &DatasetDesc {
        self.root.desc()
    }

    fn shape(&self) -> Shape {
        let mut shape = self.root.shape();
        shape.swap(0, 1);
        shape
    }

    fn rowtype(&self) -> Arc<IdType> {
        self.root.coltype()
    }

    fn coltype(&self) -> Arc<IdType> {
        self.root.rowtype()
    }

    fn producttype(&self) -> Arc<ProductIdType> {
        self.producttype.clone()
    }

    async fn rows(&self, range: &Range) -> ViewResult<Vec<String>> {
        self.root.cols(&range.swap()).await
    }

    async fn row_ids(&self, range: &Range) -> ViewResult<Range> {
        self.root.col_ids(&range.swap()).await
    }

    async fn cols(&self, range: &Range) -> ViewResult<Vec<String>> {
        self.root.rows(&range.swap()).await
    }

    async fn col_ids(&self, range: &Range) -> ViewResult<Range> {
        self.root.row_ids(&range.swap()).await
    }

    async fn ids(&self, range: &Range) -> ViewResult<Range> {
        Ok(self.root.ids(&range.swap()).await?.swap())
    }

    async fn data(&self, range: &Range) -> ViewResult<Vec<Vec<Value>>> {
        let swapped = range.swap();
        let ncols = swapped.size(&self.root.shape())?[1];
        let data = self.root.data(&swapped).await?;
        Ok(transpose(data, ncols))
    }

    async fn at(&self, row: usize, col: usize) -> ViewResult<Value> {
        self.root.at(col, row).await
    }

    fn t(&self) -> Arc<dyn MatrixData> {
        Arc::new(self.root.clone())
    }

    fn view(&self, range: &Range) -> ViewResult<MatrixView> {
        let shape = self.shape();
        MatrixView::new(Arc::new(self.clone()), Range::all().pre_multiply(range, &shape)?)
    }

    fn persist(&self) -> Persisted {
        Persisted::Transposed {
            root: Box::new(self.root.persist()),
            transposed: true,
        }
    }

    fn heatmap_url(&self, range: &Range, options: &JsonValue) -> Option<String> {
        let mut options = match options {
            JsonValue::Object(map) => map.clone(),
            _ => serde_json::Map::new(),
        };
        let flipped = !options
            .get("transpose")
            .and_then(JsonValue::as_bool)
            .unwrap_or(false);
        options.insert("transpose".to_string(), JsonValue::Bool(flipped));
        self.root
            .heatmap_url(&range.swap(), &JsonValue::Object(options))
    }

    async fn hist(
        &self,
        bins: Option<usize>,
        range: &Range,
        contained: Axis,
    ) -> ViewResult<Option<Histogram>> {
        self.root.hist(bins, &range.swap(), contained.swap()).await
    }
}
