//! Single-axis selectors.

use std::borrow::Cow;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use snafu::prelude::*;

use super::composite::CompositeRange1D;
use crate::error::{NotFoundSnafu, OutOfBoundsSnafu, ViewResult};

/// Selector over one axis.
///
/// `List` order is significant and may repeat indices; this is how sorted
/// and filtered views are expressed.
#[derive(
    Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub enum Range1D {
    /// Wildcard matching the full extent, resolved lazily.
    #[default]
    All,
    List(Vec<usize>),
    Composite(CompositeRange1D),
}

impl From<CompositeRange1D> for Range1D {
    fn from(c: CompositeRange1D) -> Self {
        Range1D::Composite(c)
    }
}

impl From<Vec<usize>> for Range1D {
    fn from(v: Vec<usize>) -> Self {
        Range1D::List(v)
    }
}

impl Range1D {
    pub fn all() -> Self {
        Range1D::All
    }

    pub fn list(indices: impl IntoIterator<Item = usize>) -> Self {
        Range1D::List(indices.into_iter().collect())
    }

    /// Dense selector `[start, end)`.
    pub fn from_range(range: std::ops::Range<usize>) -> Self {
        Range1D::List(range.collect())
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Range1D::All)
    }

    pub fn as_composite(&self) -> Option<&CompositeRange1D> {
        match self {
            Range1D::Composite(c) => Some(c),
            _ => None,
        }
    }

    /// Concrete index sequence against an axis of length `extent`.
    pub fn indices(&self, extent: usize) -> Cow<'_, [usize]> {
        match self {
            Range1D::All => Cow::Owned((0..extent).collect()),
            Range1D::List(v) => Cow::Borrowed(v),
            Range1D::Composite(c) => Cow::Owned(c.indices().collect()),
        }
    }

    /// Number of selected positions; `All` resolves to `extent`.
    pub fn size(&self, extent: usize) -> usize {
        match self {
            Range1D::All => extent,
            Range1D::List(v) => v.len(),
            Range1D::Composite(c) => c.len(),
        }
    }

    /// Fail if any explicit index falls outside `extent`.
    pub fn validate(&self, extent: usize) -> ViewResult<()> {
        match self {
            Range1D::All => Ok(()),
            other => {
                for &index in other.indices(extent).iter() {
                    ensure!(index < extent, OutOfBoundsSnafu { index, extent });
                }
                Ok(())
            }
        }
    }

    /// Physical index produced at logical position `pos`.
    pub fn at(&self, pos: usize, extent: usize) -> ViewResult<usize> {
        match self {
            Range1D::All => {
                ensure!(pos < extent, OutOfBoundsSnafu { index: pos, extent });
                Ok(pos)
            }
            Range1D::List(v) => v.get(pos).copied().context(OutOfBoundsSnafu {
                index: pos,
                extent: v.len(),
            }),
            Range1D::Composite(c) => {
                c.indices().nth(pos).context(OutOfBoundsSnafu {
                    index: pos,
                    extent: c.len(),
                })
            }
        }
    }

    /// Apply `sub` on top of this selector: position `k` of the result maps
    /// to `self[sub[k]]`. `extent` is the length of the axis `self` indexes.
    pub fn pre_multiply(
        &self,
        sub: &Range1D,
        extent: usize,
    ) -> ViewResult<Range1D> {
        match (self, sub) {
            (_, Range1D::All) => Ok(self.clone()),
            (Range1D::All, _) => {
                sub.validate(extent)?;
                Ok(sub.clone())
            }
            (base, Range1D::List(positions)) => {
                let idx = base.indices(extent);
                positions
                    .iter()
                    .map(|&p| translate(&idx, p))
                    .collect::<ViewResult<Vec<_>>>()
                    .map(Range1D::List)
            }
            (base, Range1D::Composite(c)) => {
                let idx = base.indices(extent);
                c.try_map_indices(|p| translate(&idx, p))
                    .map(Range1D::Composite)
            }
        }
    }

    /// For each physical index, every logical position that produces it,
    /// in ascending position order.
    pub fn invert(
        &self,
        indices: &[usize],
        extent: usize,
    ) -> ViewResult<Vec<usize>> {
        if let Range1D::All = self {
            for &index in indices {
                ensure!(index < extent, OutOfBoundsSnafu { index, extent });
            }
            return Ok(indices.to_vec());
        }
        let lookup = self.positions_by_index(extent);
        let mut out = Vec::with_capacity(indices.len());
        for &index in indices {
            ensure!(index < extent, OutOfBoundsSnafu { index, extent });
            let positions =
                lookup.get(&index).context(NotFoundSnafu { index })?;
            out.extend_from_slice(positions);
        }
        Ok(out)
    }

    /// Treat `self` as the identifiers at each position and map the
    /// identifiers selected by `ids` back to positions. Identifiers that are
    /// not present are skipped.
    pub fn index_of(&self, ids: &Range1D, extent: usize) -> Range1D {
        if ids.is_all() {
            return Range1D::All;
        }
        let lookup = match self {
            Range1D::All => None,
            _ => Some(self.first_position_by_index(extent)),
        };
        let resolve = |id: usize| -> Option<usize> {
            match &lookup {
                None => (id < extent).then_some(id),
                Some(lookup) => lookup.get(&id).copied(),
            }
        };
        match ids {
            Range1D::All => Range1D::All,
            Range1D::List(v) => {
                Range1D::List(v.iter().filter_map(|&id| resolve(id)).collect())
            }
            Range1D::Composite(c) => {
                Range1D::Composite(c.filter_map_indices(resolve))
            }
        }
    }

    /// Select `seq` by this range, in range order.
    pub fn filter<T: Clone>(&self, seq: &[T]) -> ViewResult<Vec<T>> {
        if self.is_all() {
            return Ok(seq.to_vec());
        }
        let extent = seq.len();
        self.indices(extent)
            .iter()
            .map(|&index| {
                seq.get(index)
                    .cloned()
                    .context(OutOfBoundsSnafu { index, extent })
            })
            .collect()
    }

    fn positions_by_index(&self, extent: usize) -> HashMap<usize, Vec<usize>> {
        let mut lookup: HashMap<usize, Vec<usize>> = HashMap::new();
        for (pos, &index) in self.indices(extent).iter().enumerate() {
            lookup.entry(index).or_default().push(pos);
        }
        lookup
    }

    fn first_position_by_index(&self, extent: usize) -> HashMap<usize, usize> {
        let mut lookup = HashMap::new();
        for (pos, &index) in self.indices(extent).iter().enumerate() {
            lookup.entry(index).or_insert(pos);
        }
        lookup
    }
}

fn translate(idx: &[usize], pos: usize) -> ViewResult<usize> {
    idx.get(pos).copied().context(OutOfBoundsSnafu {
        index: pos,
        extent: idx.len(),
    })
}
