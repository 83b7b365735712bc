use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use snafu::prelude::*;
use tracing::{debug, trace};

use super::traits::{cell_hist, Axis, MatrixData};
use super::transposed::TransposedMatrix;
use super::view::MatrixView;
use crate::backend::MatrixLoader;
use crate::error::{OutOfBoundsSnafu, ViewResult};
use crate::math::{default_bins, Histogram};
use crate::meta::{DatasetDesc, IdType, IdTypeResolver, ProductIdType, Value};
use crate::persist::Persisted;
use crate::range::{Range, Shape};

/// Root matrix: a dataset description bound to a loader.
#[derive(Clone)]
pub struct Matrix {
    inner: Arc<MatrixInner>,
}

struct MatrixInner {
    desc: DatasetDesc,
    rowtype: Arc<IdType>,
    coltype: Arc<IdType>,
    producttype: Arc<ProductIdType>,
    loader: Arc<dyn MatrixLoader>,
}

impl std::fmt::Debug for Matrix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Matrix")
            .field("id", &self.inner.desc.id)
            .field("shape", &self.inner.desc.size)
            .finish()
    }
}

impl Matrix {
    pub fn create(desc: DatasetDesc, loader: Arc<dyn MatrixLoader>) -> Self {
        let rowtype = Arc::new(IdType::new(desc.idtype.clone()));
        let coltype = Arc::new(IdType::new(desc.coltype()));
        let producttype = Arc::new(ProductIdType::new(rowtype.clone(), coltype.clone()));
        Self::from_parts(desc, rowtype, coltype, producttype, loader)
    }

    /// Like [`Matrix::create`], resolving identity types through `resolver`.
    pub fn with_resolver(
        desc: DatasetDesc,
        loader: Arc<dyn MatrixLoader>,
        resolver: &dyn IdTypeResolver,
    ) -> Self {
        let rowtype = resolver.resolve(&desc.idtype);
        let coltype = resolver.resolve(desc.coltype());
        let producttype = resolver.resolve_product(&rowtype, &coltype);
        Self::from_parts(desc, rowtype, coltype, producttype, loader)
    }

    fn from_parts(
        desc: DatasetDesc,
        rowtype: Arc<IdType>,
        coltype: Arc<IdType>,
        producttype: Arc<ProductIdType>,
        loader: Arc<dyn MatrixLoader>,
    ) -> Self {
        Self {
            inner: Arc::new(MatrixInner {
                desc,
                rowtype,
                coltype,
                producttype,
                loader,
            }),
        }
    }

    pub fn loader(&self) -> &Arc<dyn MatrixLoader> {
        &self.inner.loader
    }

    /// Concrete transposed handle.
    pub fn transposed(&self) -> TransposedMatrix {
        TransposedMatrix::new(self.clone())
    }

    fn mask_rows(&self, data: Vec<Vec<Value>>) -> Vec<Vec<Value>> {
        let value = &self.inner.desc.value;
        data.into_iter().map(|row| value.mask(row)).collect()
    }
}

fn axis(range: &Range, axis: usize) -> Range {
    Range::from(range.dim_or_all(axis).clone())
}

#[async_trait]
impl MatrixData for Matrix {
    fn desc(&self) -> &DatasetDesc {
        &self.inner.desc
    }

    fn shape(&self) -> Shape {
        let size = &self.inner.desc.size;
        smallvec::smallvec![
            size.first().copied().unwrap_or_default(),
            size.get(1).copied().unwrap_or_default()
        ]
    }

    fn rowtype(&self) -> Arc<IdType> {
        self.inner.rowtype.clone()
    }

    fn coltype(&self) -> Arc<IdType> {
        self.inner.coltype.clone()
    }

    fn producttype(&self) -> Arc<ProductIdType> {
        self.inner.producttype.clone()
    }

    async fn rows(&self, range: &Range) -> ViewResult<Vec<String>> {
        self.inner.loader.rows(&self.inner.desc, &axis(range, 0)).await
    }

    async fn row_ids(&self, range: &Range) -> ViewResult<Range> {
        self.inner.loader.row_ids(&self.inner.desc, &axis(range, 0)).await
    }

    async fn cols(&self, range: &Range) -> ViewResult<Vec<String>> {
        self.inner.loader.cols(&self.inner.desc, &axis(range, 1)).await
    }

    async fn col_ids(&self, range: &Range) -> ViewResult<Range> {
        self.inner.loader.col_ids(&self.inner.desc, &axis(range, 1)).await
    }

    async fn ids(&self, range: &Range) -> ViewResult<Range> {
        self.inner.loader.ids(&self.inner.desc, range).await
    }

    async fn data(&self, range: &Range) -> ViewResult<Vec<Vec<Value>>> {
        trace!(dataset = %self.inner.desc.id, range = %range, "root matrix data");
        let data = self.inner.loader.data(&self.inner.desc, range).await?;
        Ok(self.mask_rows(data))
    }

    async fn at(&self, row: usize, col: usize) -> ViewResult<Value> {
        let (nrows, ncols) = (self.nrows(), self.ncols());
        ensure!(row < nrows, OutOfBoundsSnafu { index: row, extent: nrows });
        ensure!(col < ncols, OutOfBoundsSnafu { index: col, extent: ncols });
        let value = self.inner.loader.at(&self.inner.desc, row, col).await?;
        Ok(self
            .inner
            .desc
            .value
            .mask(vec![value])
            .into_iter()
            .next()
            .unwrap_or(Value::Missing))
    }

    fn t(&self) -> Arc<dyn MatrixData> {
        Arc::new(self.transposed())
    }

    fn view(&self, range: &Range) -> ViewResult<MatrixView> {
        let shape = self.shape();
        MatrixView::new(Arc::new(self.clone()), Range::all().pre_multiply(range, &shape)?)
    }

    fn persist(&self) -> Persisted {
        Persisted::id(self.inner.desc.id.clone())
    }

    fn heatmap_url(&self, range: &Range, options: &JsonValue) -> Option<String> {
        self.inner
            .loader
            .capabilities()
            .heatmap_url
            .map(|h| h.heatmap_url(&self.inner.desc, range, options))
    }

    async fn hist(
        &self,
        bins: Option<usize>,
        range: &Range,
        contained: Axis,
    ) -> ViewResult<Option<Histogram>> {
        let value_type = &self.inner.desc.value;
        if !value_type.is_numeric() && !value_type.is_categorical() {
            return Ok(None);
        }
        let caps = self.inner.loader.capabilities();
        if let (true, Some(fast)) = (value_type.is_numeric(), caps.numerical_hist) {
            let cells: usize = range.size(&self.shape())?.iter().product();
            let bins = bins.unwrap_or_else(|| default_bins(cells));
            debug!(dataset = %self.inner.desc.id, bins, "loader-side histogram");
            return fast
                .numerical_hist(&self.inner.desc, range, bins)
                .await
                .map(Some);
        }
        let data = self.data(range).await?;
        Ok(Some(cell_hist(&data, value_type, bins, contained)))
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::backend::{
        HeatmapUrlLoader, MatrixLoaderCapabilities, MatrixPayload, MemoryLoader,
        NumericalHistLoader,
    };
    use crate::math::HistogramKind;
    use crate::meta::{IdTypeRegistry, ValueTypeDesc};
    use crate::range::list;
    use crate::ViewError;

    fn payload() -> MatrixPayload {
        MatrixPayload::new(
            vec!["r0".into(), "r1".into()],
            vec![0, 1],
            vec!["c0".into(), "c1".into()],
            vec![0, 1],
            vec![vec![1.0.into(), (-9.0).into()], vec![3.0.into(), 4.0.into()]],
        )
        .unwrap()
    }

    fn desc() -> DatasetDesc {
        DatasetDesc::matrix(
            "m",
            2,
            2,
            ValueTypeDesc::Real {
                range: Some([0.0, 4.0]),
                missing: Some(-9.0),
            },
        )
    }

    /// Memory loader that also serves histograms and heatmap urls.
    struct ServerLoader {
        inner: MemoryLoader<MatrixPayload>,
    }

    #[async_trait]
    impl MatrixLoader for ServerLoader {
        async fn rows(&self, desc: &DatasetDesc, range: &Range) -> ViewResult<Vec<String>> {
            self.inner.rows(desc, range).await
        }

        async fn row_ids(&self, desc: &DatasetDesc, range: &Range) -> ViewResult<Range> {
            self.inner.row_ids(desc, range).await
        }

        async fn cols(&self, desc: &DatasetDesc, range: &Range) -> ViewResult<Vec<String>> {
            self.inner.cols(desc, range).await
        }

        async fn col_ids(&self, desc: &DatasetDesc, range: &Range) -> ViewResult<Range> {
            self.inner.col_ids(desc, range).await
        }

        async fn data(&self, desc: &DatasetDesc, range: &Range) -> ViewResult<Vec<Vec<Value>>> {
            self.inner.data(desc, range).await
        }

        fn capabilities(&self) -> MatrixLoaderCapabilities<'_> {
            MatrixLoaderCapabilities {
                numerical_hist: Some(self),
                heatmap_url: Some(self),
            }
        }
    }

    #[async_trait]
    impl NumericalHistLoader for ServerLoader {
        async fn numerical_hist(
            &self,
            _desc: &DatasetDesc,
            range: &Range,
            bins: usize,
        ) -> ViewResult<Histogram> {
            Ok(Histogram {
                kind: HistogramKind::Numeric {
                    range: [0.0, bins as f64],
                },
                bins: Vec::new(),
                missing: range.ndim(),
                missing_indices: Vec::new(),
            })
        }
    }

    impl HeatmapUrlLoader for ServerLoader {
        fn heatmap_url(&self, desc: &DatasetDesc, range: &Range, options: &JsonValue) -> String {
            let transposed = options.get("transpose").and_then(JsonValue::as_bool).unwrap_or(false);
            format!("/heatmap/{}?range={range}&t={transposed}", desc.id)
        }
    }

    fn plain() -> Matrix {
        Matrix::create(desc(), Arc::new(MemoryLoader::new(payload())))
    }

    fn served() -> Matrix {
        Matrix::create(
            desc(),
            Arc::new(ServerLoader {
                inner: MemoryLoader::new(payload()),
            }),
        )
    }

    #[tokio::test]
    async fn masks_and_bounds() {
        let m = plain();
        assert_eq!(m.at(0, 1).await.unwrap(), Value::Missing);
        assert_eq!(m.at(1, 0).await.unwrap(), Value::Real(3.0));
        assert!(matches!(
            m.at(0, 2).await.unwrap_err(),
            ViewError::OutOfBounds { index: 2, extent: 2 }
        ));
        let stats = m.stats().await.unwrap().unwrap();
        assert_eq!(stats.count, 3);
        assert_eq!(stats.sum, 8.0);
    }

    #[tokio::test]
    async fn axis_accessors_read_their_axis() {
        let m = plain();
        let window = Range::new([
            crate::range::Range1D::list([1]),
            crate::range::Range1D::list([1, 0]),
        ]);
        assert_eq!(m.rows(&window).await.unwrap(), vec!["r1"]);
        assert_eq!(m.cols(&window).await.unwrap(), vec!["c1", "c0"]);
        assert_eq!(m.col_ids(&window).await.unwrap(), list([1, 0]));
        assert_eq!(m.data(&window).await.unwrap(), vec![vec![4.0.into(), 3.0.into()]]);
    }

    #[tokio::test]
    async fn local_hist_without_capability() {
        let hist = plain().hist(Some(2), &Range::all(), Axis::Cols).await.unwrap().unwrap();
        assert_eq!(hist.counts(), vec![1, 2]);
        assert_eq!(hist.missing_indices, vec![1]);
        assert_eq!(plain().heatmap_url(&Range::all(), &json!({})), None);
    }

    #[tokio::test]
    async fn loader_fast_paths_are_used_when_offered() {
        let m = served();
        let hist = m.hist(None, &Range::all(), Axis::Rows).await.unwrap().unwrap();
        assert_eq!(hist.kind, HistogramKind::Numeric { range: [0.0, 2.0] });
        assert_eq!(
            m.heatmap_url(&list([1]), &json!({})).as_deref(),
            Some("/heatmap/m?range=(1)&t=false")
        );
    }

    #[test]
    fn resolver_builds_product_type() {
        let registry = IdTypeRegistry::new();
        let m = Matrix::with_resolver(desc(), Arc::new(MemoryLoader::new(payload())), &registry);
        assert_eq!(m.producttype().id(), "_rowsX_cols");
        assert!(Arc::ptr_eq(&m.rowtype(), &registry.resolve("_rows")));
        assert_eq!(m.shape().as_slice(), &[2, 2]);
    }
}
