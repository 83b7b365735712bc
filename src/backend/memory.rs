//! Fully materialized dataset payloads and the loader serving them.

use std::sync::Arc;

use async_trait::async_trait;
use snafu::prelude::*;

use super::traits::{MatrixLoader, VectorLoader};
use crate::error::{InvalidTableSnafu, OutOfBoundsSnafu, ViewResult};
use crate::meta::{DatasetDesc, Value};
use crate::range::Range;

/// Whole contents of a vector dataset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VectorPayload {
    pub rows: Vec<String>,
    pub row_ids: Vec<usize>,
    pub data: Vec<Value>,
}

impl VectorPayload {
    pub fn new(rows: Vec<String>, row_ids: Vec<usize>, data: Vec<Value>) -> ViewResult<Self> {
        ensure!(
            rows.len() == data.len() && row_ids.len() == data.len(),
            InvalidTableSnafu {
                msg: format!(
                    "{} names and {} ids for {} values",
                    rows.len(),
                    row_ids.len(),
                    data.len()
                ),
            }
        );
        Ok(Self { rows, row_ids, data })
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub(crate) fn select_rows(&self, range: &Range) -> ViewResult<Vec<String>> {
        range.filter(&self.rows)
    }

    pub(crate) fn select_ids(&self, range: &Range) -> ViewResult<Range> {
        Ok(Range::list(range.filter(&self.row_ids)?))
    }

    pub(crate) fn select_data(&self, range: &Range) -> ViewResult<Vec<Value>> {
        range.filter(&self.data)
    }
}

/// Whole contents of a matrix dataset, row-major.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatrixPayload {
    pub rows: Vec<String>,
    pub row_ids: Vec<usize>,
    pub cols: Vec<String>,
    pub col_ids: Vec<usize>,
    pub data: Vec<Vec<Value>>,
}

impl MatrixPayload {
    pub fn new(
        rows: Vec<String>,
        row_ids: Vec<usize>,
        cols: Vec<String>,
        col_ids: Vec<usize>,
        data: Vec<Vec<Value>>,
    ) -> ViewResult<Self> {
        ensure!(
            rows.len() == data.len() && row_ids.len() == data.len(),
            InvalidTableSnafu {
                msg: format!(
                    "{} row names and {} row ids for {} rows",
                    rows.len(),
                    row_ids.len(),
                    data.len()
                ),
            }
        );
        ensure!(
            cols.len() == col_ids.len(),
            InvalidTableSnafu {
                msg: format!("{} column names and {} column ids", cols.len(), col_ids.len()),
            }
        );
        if let Some(bad) = data.iter().position(|r| r.len() != cols.len()) {
            return InvalidTableSnafu {
                msg: format!(
                    "row {bad} has {} cells, expected {}",
                    data[bad].len(),
                    cols.len()
                ),
            }
            .fail();
        }
        Ok(Self {
            rows,
            row_ids,
            cols,
            col_ids,
            data,
        })
    }

    pub fn nrows(&self) -> usize {
        self.data.len()
    }

    pub fn ncols(&self) -> usize {
        self.cols.len()
    }

    pub(crate) fn select_rows(&self, range: &Range) -> ViewResult<Vec<String>> {
        range.filter(&self.rows)
    }

    pub(crate) fn select_row_ids(&self, range: &Range) -> ViewResult<Range> {
        Ok(Range::list(range.filter(&self.row_ids)?))
    }

    pub(crate) fn select_cols(&self, range: &Range) -> ViewResult<Vec<String>> {
        range.filter(&self.cols)
    }

    pub(crate) fn select_col_ids(&self, range: &Range) -> ViewResult<Range> {
        Ok(Range::list(range.filter(&self.col_ids)?))
    }

    pub(crate) fn select_data(&self, range: &Range) -> ViewResult<Vec<Vec<Value>>> {
        range.filter_matrix(&self.data, self.ncols())
    }

    pub(crate) fn cell(&self, row: usize, col: usize) -> ViewResult<Value> {
        let cells = self.data.get(row).context(OutOfBoundsSnafu {
            index: row,
            extent: self.nrows(),
        })?;
        cells.get(col).cloned().context(OutOfBoundsSnafu {
            index: col,
            extent: self.ncols(),
        })
    }
}

/// Loader over a payload that is already in memory.
#[derive(Debug, Clone)]
pub struct MemoryLoader<P> {
    payload: Arc<P>,
}

impl<P> MemoryLoader<P> {
    pub fn new(payload: P) -> Self {
        Self {
            payload: Arc::new(payload),
        }
    }

    pub fn payload(&self) -> &P {
        &self.payload
    }
}

#[async_trait]
impl VectorLoader for MemoryLoader<VectorPayload> {
    async fn rows(&self, _desc: &DatasetDesc, range: &Range) -> ViewResult<Vec<String>> {
        self.payload.select_rows(range)
    }

    async fn ids(&self, _desc: &DatasetDesc, range: &Range) -> ViewResult<Range> {
        self.payload.select_ids(range)
    }

    async fn data(&self, _desc: &DatasetDesc, range: &Range) -> ViewResult<Vec<Value>> {
        self.payload.select_data(range)
    }
}

#[async_trait]
impl MatrixLoader for MemoryLoader<MatrixPayload> {
    async fn rows(&self, _desc: &DatasetDesc, range: &Range) -> ViewResult<Vec<String>> {
        self.payload.select_rows(range)
    }

    async fn row_ids(&self, _desc: &DatasetDesc, range: &Range) -> ViewResult<Range> {
        self.payload.select_row_ids(range)
    }

    async fn cols(&self, _desc: &DatasetDesc, range: &Range) -> ViewResult<Vec<String>> {
        self.payload.select_cols(range)
    }

    async fn col_ids(&self, _desc: &DatasetDesc, range: &Range) -> ViewResult<Range> {
        self.payload.select_col_ids(range)
    }

    async fn data(&self, _desc: &DatasetDesc, range: &Range) -> ViewResult<Vec<Vec<Value>>> {
        self.payload.select_data(range)
    }

    async fn at(&self, _desc: &DatasetDesc, row: usize, col: usize) -> ViewResult<Value> {
        self.payload.cell(row, col)
    }
}
