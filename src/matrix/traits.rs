//! The matrix contract and its shared engine.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::trace;

use super::view::MatrixView;
use crate::error::{UnsupportedPersistedSnafu, ViewResult};
use crate::math::{
    categorical_hist, compute_stats, default_bins, numeric_hist, Histogram, Statistics,
};
use crate::meta::{DatasetDesc, IdType, ProductIdType, Value, ValueTypeDesc};
use crate::persist::Persisted;
use crate::range::{self, Range, Shape};

/// Axis whose indices a matrix histogram records per bin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    #[default]
    Rows,
    Cols,
}

impl Axis {
    pub fn swap(self) -> Axis {
        match self {
            Axis::Rows => Axis::Cols,
            Axis::Cols => Axis::Rows,
        }
    }
}

/// Minimal contract of a two-dimensional dataset.
///
/// Ranges are two-axis `(rows, cols)` selectors relative to this matrix;
/// row accessors read the first axis and column accessors the second.
#[async_trait]
pub trait MatrixData: Send + Sync {
    /// Description of the underlying root dataset.
    fn desc(&self) -> &DatasetDesc;

    /// `[rows, cols]` as seen through this matrix.
    fn shape(&self) -> Shape;

    fn nrows(&self) -> usize {
        self.shape()[0]
    }

    fn ncols(&self) -> usize {
        self.shape()[1]
    }

    fn value_type(&self) -> &ValueTypeDesc {
        &self.desc().value
    }

    fn rowtype(&self) -> Arc<IdType>;

    fn coltype(&self) -> Arc<IdType>;

    fn producttype(&self) -> Arc<ProductIdType>;

    async fn rows(&self, range: &Range) -> ViewResult<Vec<String>>;

    async fn row_ids(&self, range: &Range) -> ViewResult<Range>;

    async fn cols(&self, range: &Range) -> ViewResult<Vec<String>>;

    async fn col_ids(&self, range: &Range) -> ViewResult<Range>;

    /// Two-axis identifier range.
    async fn ids(&self, range: &Range) -> ViewResult<Range>;

    /// Row-major cells.
    async fn data(&self, range: &Range) -> ViewResult<Vec<Vec<Value>>>;

    async fn at(&self, row: usize, col: usize) -> ViewResult<Value>;

    /// Transposed counterpart. Not memoized; every call builds a fresh
    /// handle over the same root.
    fn t(&self) -> Arc<dyn MatrixData>;

    /// Lazy view of `range`, composed with any range this matrix carries.
    fn view(&self, range: &Range) -> ViewResult<MatrixView>;

    fn persist(&self) -> Persisted;

    /// Location of a rendered heatmap of `range`, when the loader offers one.
    fn heatmap_url(&self, _range: &Range, _options: &JsonValue) -> Option<String> {
        None
    }

    async fn stats(&self) -> ViewResult<Option<Statistics>> {
        if !self.value_type().is_numeric() {
            return Ok(None);
        }
        let data = self.data(&Range::all()).await?;
        Ok(Some(compute_stats(
            data.iter().flatten().map(Value::to_f64_or_nan),
        )))
    }

    /// Histogram over the cells selected by `range`; each bin records the
    /// row or column position of its cells according to `contained`.
    async fn hist(
        &self,
        bins: Option<usize>,
        range: &Range,
        contained: Axis,
    ) -> ViewResult<Option<Histogram>> {
        let value_type = self.value_type();
        if !value_type.is_numeric() && !value_type.is_categorical() {
            return Ok(None);
        }
        let data = self.data(range).await?;
        Ok(Some(cell_hist(&data, value_type, bins, contained)))
    }

    /// View of the cells whose row and column identifiers are selected by
    /// `ids`. Identifiers this matrix does not contain are skipped.
    async fn id_view(&self, ids: &Range) -> ViewResult<MatrixView> {
        let mine = self.ids(&Range::all()).await?;
        let positions = mine.index_of(ids, &self.shape())?;
        trace!(dataset = %self.desc().id, ids = %ids, positions = %positions, "matrix id view");
        self.view(&positions)
    }

    /// Rebuild a view from `{"range": "..."}`; without a range the result
    /// is equivalent to this matrix.
    async fn restore(&self, persisted: &JsonValue) -> ViewResult<MatrixView> {
        match persisted.get("range") {
            None | Some(JsonValue::Null) => self.view(&Range::all()),
            Some(JsonValue::String(text)) => self.view(&range::parse(text.as_str())?),
            Some(other) => UnsupportedPersistedSnafu {
                what: "matrix view",
                persisted: other.to_string(),
            }
            .fail(),
        }
    }
}

/// Histogram of row-major `data`, computed locally.
pub(crate) fn cell_hist(
    data: &[Vec<Value>],
    value_type: &ValueTypeDesc,
    bins: Option<usize>,
    contained: Axis,
) -> Histogram {
    let mut cells = Vec::new();
    let mut indices = Vec::new();
    for (i, row) in data.iter().enumerate() {
        for (j, cell) in row.iter().enumerate() {
            cells.push(cell.clone());
            indices.push(match contained {
                Axis::Rows => i,
                Axis::Cols => j,
            });
        }
    }
    if value_type.is_categorical() {
        return categorical_hist(&cells, &indices, value_type.categories());
    }
    let values: Vec<f64> = cells.iter().map(Value::to_f64_or_nan).collect();
    let bins = bins.unwrap_or_else(|| default_bins(values.len()));
    numeric_hist(&values, &indices, bins, value_type.numeric_range())
}

/// Swap rows and columns of row-major `data` with `ncols` columns.
pub(crate) fn transpose(data: Vec<Vec<Value>>, ncols: usize) -> Vec<Vec<Value>> {
    let mut out: Vec<Vec<Value>> = (0..ncols).map(|_| Vec::with_capacity(data.len())).collect();
    for row in data {
        for (j, cell) in row.into_iter().enumerate() {
            if let Some(col) = out.get_mut(j) {
                col.push(cell);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(raw: &[&[i64]]) -> Vec<Vec<Value>> {
        raw.iter()
            .map(|r| r.iter().map(|&x| Value::Int(x)).collect())
            .collect()
    }

    #[test]
    fn transpose_swaps_axes() {
        let t = transpose(cells(&[&[1, 2, 3], &[4, 5, 6]]), 3);
        assert_eq!(t, cells(&[&[1, 4], &[2, 5], &[3, 6]]));
        assert_eq!(transpose(Vec::new(), 2), vec![Vec::new(), Vec::new()]);
    }

    #[test]
    fn cell_hist_records_the_contained_axis() {
        let data = cells(&[&[0, 9], &[9, 9]]);
        let vt = ValueTypeDesc::Int {
            range: Some([0.0, 9.0]),
            missing: None,
        };
        let rows = cell_hist(&data, &vt, Some(2), Axis::Rows);
        assert_eq!(rows.counts(), vec![1, 3]);
        assert_eq!(rows.bins[1].indices, vec![0, 1, 1]);
        let cols = cell_hist(&data, &vt, Some(2), Axis::Cols);
        assert_eq!(cols.bins[1].indices, vec![1, 0, 1]);
    }

    #[test]
    fn axis_swap() {
        assert_eq!(Axis::Rows.swap(), Axis::Cols);
        assert_eq!(Axis::default(), Axis::Rows);
    }
}
