//! Grouped first-axis selectors.

use serde::{Deserialize, Serialize};

use crate::error::ViewResult;

/// Neutral color used when no category metadata provides one.
pub const DEFAULT_COLOR: &str = "gray";

/// Name of the single group produced by [`as_ungrouped`].
pub const UNGROUPED_NAME: &str = "unnamed";

/// One named, colored group of indices.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range1DGroup {
    pub name: String,
    pub color: String,
    indices: Vec<usize>,
}

impl Range1DGroup {
    pub fn new(
        name: impl Into<String>,
        color: impl Into<String>,
        indices: impl IntoIterator<Item = usize>,
    ) -> Self {
        Self {
            name: name.into(),
            color: color.into(),
            indices: indices.into_iter().collect(),
        }
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub(crate) fn try_map_indices(
        &self,
        mut f: impl FnMut(usize) -> ViewResult<usize>,
    ) -> ViewResult<Range1DGroup> {
        let indices = self
            .indices
            .iter()
            .map(|&i| f(i))
            .collect::<ViewResult<Vec<_>>>()?;
        Ok(Range1DGroup {
            name: self.name.clone(),
            color: self.color.clone(),
            indices,
        })
    }
}

/// A first-axis selector partitioned into named groups.
///
/// The logical index order is the concatenation of the groups in
/// declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompositeRange1D {
    pub name: String,
    pub groups: Vec<Range1DGroup>,
}

impl CompositeRange1D {
    pub fn new(
        name: impl Into<String>,
        groups: impl IntoIterator<Item = Range1DGroup>,
    ) -> Self {
        Self {
            name: name.into(),
            groups: groups.into_iter().collect(),
        }
    }

    /// Total number of indices over all groups.
    pub fn len(&self) -> usize {
        self.groups.iter().map(Range1DGroup::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn ngroups(&self) -> usize {
        self.groups.len()
    }

    pub fn group(&self, index: usize) -> Option<&Range1DGroup> {
        self.groups.get(index)
    }

    /// Flattened indices in group order.
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.groups
            .iter()
            .flat_map(|g| g.indices.iter().copied())
    }

    pub(crate) fn try_map_indices(
        &self,
        mut f: impl FnMut(usize) -> ViewResult<usize>,
    ) -> ViewResult<CompositeRange1D> {
        let groups = self
            .groups
            .iter()
            .map(|g| g.try_map_indices(&mut f))
            .collect::<ViewResult<Vec<_>>>()?;
        Ok(CompositeRange1D {
            name: self.name.clone(),
            groups,
        })
    }

    /// Keep only the indices for which `f` yields a replacement.
    pub(crate) fn filter_map_indices(
        &self,
        mut f: impl FnMut(usize) -> Option<usize>,
    ) -> CompositeRange1D {
        let groups = self
            .groups
            .iter()
            .map(|g| Range1DGroup {
                name: g.name.clone(),
                color: g.color.clone(),
                indices: g.indices.iter().filter_map(|&i| f(i)).collect(),
            })
            .collect();
        CompositeRange1D {
            name: self.name.clone(),
            groups,
        }
    }
}

/// Build a named, grouped selector.
pub fn composite(
    name: impl Into<String>,
    groups: impl IntoIterator<Item = Range1DGroup>,
) -> CompositeRange1D {
    CompositeRange1D::new(name, groups)
}

/// The degenerate single group covering `indices`.
pub fn as_ungrouped(
    indices: impl IntoIterator<Item = usize>,
) -> Range1DGroup {
    Range1DGroup::new(UNGROUPED_NAME, DEFAULT_COLOR, indices)
}
