//! Named partitions of a vector's positions.

use serde::Serialize;
use snafu::prelude::*;

use super::traits::VectorData;
use super::view::VectorView;
use crate::error::{GroupOutOfRangeSnafu, ViewResult};
use crate::math::{range_hist, Histogram};
use crate::meta::{DataKind, DatasetDesc, ValueTypeDesc};
use crate::persist::Persisted;
use crate::range::{CompositeRange1D, Range, Range1D, Range1DGroup};

/// Display summary of one group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupDesc {
    pub name: String,
    pub color: String,
    pub size: usize,
}

/// A read-only partition of a vector into named, colored groups.
///
/// Group indices are positions of the originating vector.
#[derive(Debug, Clone)]
pub struct Stratification {
    desc: DatasetDesc,
    origin: VectorView,
    range: CompositeRange1D,
}

impl Stratification {
    pub fn new(origin: VectorView, range: CompositeRange1D) -> Self {
        let base = origin.desc();
        let mut desc = DatasetDesc::vector(
            format!("{}-s", base.id),
            range.len(),
            ValueTypeDesc::categorical(range.groups.iter().map(|g| g.name.as_str())),
        );
        desc.name = format!("{}-s", base.name);
        desc.fqname = format!("{}-s", base.fqname);
        desc.kind = DataKind::Stratification;
        desc.idtype = base.idtype.clone();
        Self {
            desc,
            origin,
            range,
        }
    }

    pub fn desc(&self) -> &DatasetDesc {
        &self.desc
    }

    /// Vector the groups index into.
    pub fn origin(&self) -> &VectorView {
        &self.origin
    }

    pub fn composite(&self) -> &CompositeRange1D {
        &self.range
    }

    pub fn range(&self) -> Range {
        Range::from(self.range.clone())
    }

    /// Number of grouped entries.
    pub fn len(&self) -> usize {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }

    pub fn ngroups(&self) -> usize {
        self.range.ngroups()
    }

    pub fn groups(&self) -> Vec<GroupDesc> {
        self.range
            .groups
            .iter()
            .map(|g| GroupDesc {
                name: g.name.clone(),
                color: g.color.clone(),
                size: g.len(),
            })
            .collect()
    }

    pub fn group(&self, index: usize) -> ViewResult<StratificationGroup> {
        let group = self.range.group(index).context(GroupOutOfRangeSnafu {
            index,
            ngroups: self.ngroups(),
        })?;
        Ok(StratificationGroup {
            parent: self.clone(),
            index,
            group: group.clone(),
        })
    }

    /// Names of the grouped entries, in group order.
    pub async fn names(&self) -> ViewResult<Vec<String>> {
        self.origin.names(&self.range()).await
    }

    /// Identifiers of the grouped entries, in group order.
    pub async fn ids(&self) -> ViewResult<Range> {
        self.origin.ids(&self.range()).await
    }

    /// The partition expressed over identifiers instead of positions.
    pub async fn id_range(&self) -> ViewResult<CompositeRange1D> {
        let ids = self.origin.ids(&Range::all()).await?;
        let translated = ids
            .dim_or_all(0)
            .pre_multiply(&Range1D::Composite(self.range.clone()), self.origin.len())?;
        match translated {
            Range1D::Composite(c) => Ok(c),
            other => Ok(CompositeRange1D::new(
                self.range.name.clone(),
                [Range1DGroup::new(
                    self.range.name.clone(),
                    crate::range::DEFAULT_COLOR,
                    other.indices(self.origin.len()).iter().copied(),
                )],
            )),
        }
    }

    /// One bin per group.
    pub fn hist(&self) -> Histogram {
        range_hist(&self.range)
    }

    pub fn persist(&self) -> Persisted {
        Persisted::Stratification {
            root: Box::new(self.origin.persist()),
            asstrat: true,
        }
    }
}

/// One group of a [`Stratification`].
#[derive(Debug, Clone)]
pub struct StratificationGroup {
    parent: Stratification,
    index: usize,
    group: Range1DGroup,
}

impl StratificationGroup {
    pub fn name(&self) -> &str {
        &self.group.name
    }

    pub fn color(&self) -> &str {
        &self.group.color
    }

    pub fn len(&self) -> usize {
        self.group.len()
    }

    pub fn is_empty(&self) -> bool {
        self.group.is_empty()
    }

    pub fn stratification(&self) -> &Stratification {
        &self.parent
    }

    /// Positions of the group within the originating vector.
    pub fn range(&self) -> Range {
        Range::list(self.group.indices().iter().copied())
    }

    /// The originating vector restricted to this group.
    pub fn vector(&self) -> ViewResult<VectorView> {
        self.parent.origin.view(&self.range())
    }

    pub async fn names(&self) -> ViewResult<Vec<String>> {
        self.parent.origin.names(&self.range()).await
    }

    pub async fn ids(&self) -> ViewResult<Range> {
        self.parent.origin.ids(&self.range()).await
    }

    pub fn persist(&self) -> Persisted {
        Persisted::Group {
            root: Box::new(self.parent.persist()),
            group: self.index,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::{Category, Value};
    use crate::range::{list, DEFAULT_COLOR};
    use crate::vector::{Vector, VectorExt};
    use crate::ViewError;

    fn colors() -> Vector {
        let desc = DatasetDesc::vector(
            "colors",
            6,
            ValueTypeDesc::Categorical {
                categories: vec![
                    Category::Detailed {
                        name: "r".into(),
                        label: Some("Red".into()),
                        color: Some("red".into()),
                    },
                    Category::Name("g".into()),
                    Category::Name("b".into()),
                    Category::Name("unused".into()),
                ],
            },
        );
        let data = ["g", "r", "b", "r", "g", "r"].into_iter().map(Value::from).collect();
        let names = (0..6).map(|i| format!("p{i}")).collect();
        Vector::wrap(desc, names, (100..106).collect(), data).unwrap()
    }

    #[tokio::test]
    async fn groups_follow_declared_categories() {
        let v = colors();
        let strat = v.as_stratification().await.unwrap();
        assert_eq!(strat.desc().id, "colors-s");
        assert_eq!(strat.desc().kind, DataKind::Stratification);
        assert_eq!(
            strat.groups(),
            vec![
                GroupDesc { name: "Red".into(), color: "red".into(), size: 3 },
                GroupDesc { name: "g".into(), color: DEFAULT_COLOR.into(), size: 2 },
                GroupDesc { name: "b".into(), color: DEFAULT_COLOR.into(), size: 1 },
            ]
        );
        assert_eq!(strat.hist().counts(), vec![3, 2, 1]);
        assert_eq!(
            strat.names().await.unwrap(),
            vec!["p1", "p3", "p5", "p0", "p4", "p2"]
        );
    }

    #[tokio::test]
    async fn group_vectors_hold_exactly_their_category() {
        let strat = colors().as_stratification().await.unwrap();
        for i in 0..strat.ngroups() {
            let group = strat.group(i).unwrap();
            let sub = group.vector().unwrap();
            assert_eq!(sub.len(), group.len());
            let data = sub.data(&Range::all()).await.unwrap();
            let expected = strat.composite().groups[i].name.clone();
            let expected = if expected == "Red" { "r".to_string() } else { expected };
            assert!(data.iter().all(|v| v == &Value::from(expected.as_str())));
        }
        let err = strat.group(3).unwrap_err();
        assert!(matches!(err, ViewError::GroupOutOfRange { index: 3, ngroups: 3 }));
    }

    #[tokio::test]
    async fn stratifying_a_view_indexes_view_positions() {
        let view = colors().view(&list([5, 0, 2])).unwrap();
        let strat = view.as_stratification().await.unwrap();
        let red = strat.group(0).unwrap();
        assert_eq!(red.range(), list([0]));
        assert_eq!(red.names().await.unwrap(), vec!["p5"]);
        assert_eq!(red.ids().await.unwrap(), list([105]));
        let ids = strat.id_range().await.unwrap();
        assert_eq!(ids.groups[1].indices(), &[100]);
    }

    #[tokio::test]
    async fn non_categorical_vectors_are_ungrouped() {
        let desc = DatasetDesc::vector("n", 3, ValueTypeDesc::real());
        let v = Vector::wrap(
            desc,
            vec!["a".into(), "b".into(), "c".into()],
            vec![0, 1, 2],
            vec![1.0.into(), 2.0.into(), 3.0.into()],
        )
        .unwrap();
        let groups = v.groups().await.unwrap();
        assert_eq!(groups.name, "n");
        assert_eq!(groups.ngroups(), 1);
        assert_eq!(groups.groups[0].indices(), &[0, 1, 2]);
    }

    #[tokio::test]
    async fn persisted_forms_nest() {
        let strat = colors().as_stratification().await.unwrap();
        assert_eq!(
            strat.group(1).unwrap().persist().to_json().unwrap(),
            serde_json::json!({"root": {"root": "colors", "asstrat": true}, "group": 1})
        );
    }
}
