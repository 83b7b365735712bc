//! Range algebra: immutable multi-dimensional index selections.
//!
//! A [`Range`] is an ordered sequence of per-axis [`Range1D`] selectors.
//! Axes past the last explicit selector behave as [`Range1D::All`], so the
//! empty range is the wildcard over any number of dimensions.
//!
//! Composition ([`Range::pre_multiply`]) is index translation, not set
//! intersection: `a.pre_multiply(b)` yields at position `k` the index `a`
//! produces at position `b[k]`.

mod composite;
mod dim;
mod parse;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use snafu::prelude::*;

pub use composite::{
    as_ungrouped, composite, CompositeRange1D, Range1DGroup, DEFAULT_COLOR,
    UNGROUPED_NAME,
};
pub use dim::Range1D;

use crate::error::{AxisOutOfRangeSnafu, ViewResult};

static ALL: Range1D = Range1D::All;

/// Per-axis lengths of a dataset or view.
pub type Shape = SmallVec<[usize; 2]>;

#[derive(
    Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub struct Range {
    dims: SmallVec<[Range1D; 2]>,
}

/// Anything accepted where a range is expected.
#[derive(Debug, Clone)]
pub enum RangeLike {
    Range(Range),
    Text(String),
    Indices(Vec<usize>),
}

impl From<Range> for RangeLike {
    fn from(r: Range) -> Self {
        RangeLike::Range(r)
    }
}

impl From<&Range> for RangeLike {
    fn from(r: &Range) -> Self {
        RangeLike::Range(r.clone())
    }
}

impl From<&str> for RangeLike {
    fn from(s: &str) -> Self {
        RangeLike::Text(s.to_string())
    }
}

impl From<String> for RangeLike {
    fn from(s: String) -> Self {
        RangeLike::Text(s)
    }
}

impl From<Vec<usize>> for RangeLike {
    fn from(v: Vec<usize>) -> Self {
        RangeLike::Indices(v)
    }
}

impl From<&[usize]> for RangeLike {
    fn from(v: &[usize]) -> Self {
        RangeLike::Indices(v.to_vec())
    }
}

/// Parse a range, its canonical text form, or a bare index list.
pub fn parse(like: impl Into<RangeLike>) -> ViewResult<Range> {
    match like.into() {
        RangeLike::Range(r) => Ok(r),
        RangeLike::Text(s) => parse::parse_range(&s),
        RangeLike::Indices(v) => Ok(Range::list(v)),
    }
}

/// Wildcard range.
pub fn all() -> Range {
    Range::all()
}

/// Single-axis explicit selector.
pub fn list(indices: impl IntoIterator<Item = usize>) -> Range {
    Range::list(indices)
}

/// Pair two ranges into `(a.dim(0), b.dim(0))`.
pub fn join(a: &Range, b: &Range) -> Range {
    Range::join([a, b])
}

impl From<Range1D> for Range {
    fn from(d: Range1D) -> Self {
        Range::new([d])
    }
}

impl From<CompositeRange1D> for Range {
    fn from(c: CompositeRange1D) -> Self {
        Range::new([Range1D::Composite(c)])
    }
}

impl Range {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn new(dims: impl IntoIterator<Item = Range1D>) -> Self {
        Self {
            dims: dims.into_iter().collect(),
        }
    }

    pub fn list(indices: impl IntoIterator<Item = usize>) -> Self {
        Self::new([Range1D::list(indices)])
    }

    /// Combine the first-axis selectors of `parts` into one range, one axis
    /// per part.
    pub fn join<'a>(parts: impl IntoIterator<Item = &'a Range>) -> Self {
        Self::new(parts.into_iter().map(|r| r.dim_or_all(0).clone()))
    }

    pub fn ndim(&self) -> usize {
        self.dims.len()
    }

    pub fn dims(&self) -> &[Range1D] {
        &self.dims
    }

    pub fn is_all(&self) -> bool {
        self.dims.iter().all(Range1D::is_all)
    }

    /// Selector of `axis`; fails when the range has fewer axes.
    pub fn dim(&self, axis: usize) -> ViewResult<&Range1D> {
        self.dims.get(axis).context(AxisOutOfRangeSnafu {
            axis,
            ndim: self.ndim(),
        })
    }

    /// Selector of `axis`, with missing axes read as the wildcard.
    pub fn dim_or_all(&self, axis: usize) -> &Range1D {
        self.dims.get(axis).unwrap_or(&ALL)
    }

    /// Range with the first two axes exchanged.
    pub fn swap(&self) -> Range {
        if self.dims.len() < 2 && self.is_all() {
            return Range::all();
        }
        let mut dims: SmallVec<[Range1D; 2]> =
            smallvec::smallvec![self.dim_or_all(1).clone(), self.dim_or_all(0).clone()];
        dims.extend(self.dims.iter().skip(2).cloned());
        Range { dims }
    }

    fn check_ndim(&self, extent: &[usize]) -> ViewResult<()> {
        ensure!(
            self.ndim() <= extent.len(),
            AxisOutOfRangeSnafu {
                axis: self.ndim() - 1,
                ndim: extent.len(),
            }
        );
        Ok(())
    }

    /// Concrete per-axis counts against `extent`.
    pub fn size(&self, extent: &[usize]) -> ViewResult<Shape> {
        self.check_ndim(extent)?;
        Ok(extent
            .iter()
            .enumerate()
            .map(|(axis, &e)| self.dim_or_all(axis).size(e))
            .collect())
    }

    /// Apply `sub` on top of this range. `extent` is the shape of the data
    /// this range indexes.
    pub fn pre_multiply(&self, sub: &Range, extent: &[usize]) -> ViewResult<Range> {
        self.check_ndim(extent)?;
        sub.check_ndim(extent)?;
        if sub.is_all() {
            return Ok(self.clone());
        }
        let ndim = self.ndim().max(sub.ndim());
        let dims = (0..ndim)
            .map(|axis| {
                self.dim_or_all(axis)
                    .pre_multiply(sub.dim_or_all(axis), extent[axis])
            })
            .collect::<ViewResult<SmallVec<[Range1D; 2]>>>()?;
        Ok(Range { dims })
    }

    /// Logical first-axis positions that produce `indices`.
    pub fn invert(&self, indices: &[usize], extent: &[usize]) -> ViewResult<Vec<usize>> {
        self.check_ndim(extent)?;
        let first = extent.first().copied().unwrap_or_default();
        self.dim_or_all(0).invert(indices, first)
    }

    /// Treat this range as identifiers per position and map the identifier
    /// range `ids` back to positions, axis by axis.
    pub fn index_of(&self, ids: &Range, extent: &[usize]) -> ViewResult<Range> {
        self.check_ndim(extent)?;
        ids.check_ndim(extent)?;
        let ndim = self.ndim().max(ids.ndim());
        Ok(Range::new((0..ndim).map(|axis| {
            self.dim_or_all(axis)
                .index_of(ids.dim_or_all(axis), extent[axis])
        })))
    }

    /// Apply the first-axis selector to `seq`.
    pub fn filter<T: Clone>(&self, seq: &[T]) -> ViewResult<Vec<T>> {
        self.dim_or_all(0).filter(seq)
    }

    /// Apply both axes to row-major `rows` with `ncols` columns.
    pub fn filter_matrix<T: Clone>(
        &self,
        rows: &[Vec<T>],
        ncols: usize,
    ) -> ViewResult<Vec<Vec<T>>> {
        self.check_ndim(&[rows.len(), ncols])?;
        let cols = self.dim_or_all(1);
        self.dim_or_all(0)
            .filter(rows)?
            .iter()
            .map(|row| cols.filter(row))
            .collect()
    }
}
