use std::sync::Arc;

use async_trait::async_trait;
use tracing::trace;

use super::root::Vector;
use super::traits::VectorData;
use crate::error::ViewResult;
use crate::meta::{DatasetDesc, IdType, Value};
use crate::persist::Persisted;
use crate::range::Range;

/// A root vector seen through a range. Holds no data.
///
/// Views of views compose eagerly: the stored range is always relative to
/// the root, so every access costs one loader call regardless of depth.
#[derive(Debug, Clone)]
pub struct VectorView {
    root: Vector,
    range: Range,
    len: usize,
}

impl VectorView {
    pub(crate) fn new(root: Vector, range: Range) -> ViewResult<Self> {
        let len = range.size(&[root.len()])?[0];
        Ok(Self { root, range, len })
    }

    pub fn root(&self) -> &Vector {
        &self.root
    }

    /// Effective range in root coordinates.
    pub fn range(&self) -> &Range {
        &self.range
    }

    fn compose(&self, range: &Range) -> ViewResult<Range> {
        self.range.pre_multiply(range, &[self.root.len()])
    }
}

#[async_trait]
impl VectorData for VectorView {
    fn desc(&self) -> &DatasetDesc {
        self.root.desc()
    }

    fn len(&self) -> usize {
        self.len
    }

    fn idtype(&self) -> Arc<IdType> {
        self.root.idtype()
    }

    async fn names(&self, range: &Range) -> ViewResult<Vec<String>> {
        self.root.names(&self.compose(range)?).await
    }

    async fn ids(&self, range: &Range) -> ViewResult<Range> {
        self.root.ids(&self.compose(range)?).await
    }

    async fn data(&self, range: &Range) -> ViewResult<Vec<Value>> {
        let composed = self.compose(range)?;
        trace!(dataset = %self.desc().id, range = %composed, "view data");
        self.root.data(&composed).await
    }

    async fn at(&self, index: usize) -> ViewResult<Value> {
        let physical = self.range.dim_or_all(0).at(index, self.root.len())?;
        self.root.at(physical).await
    }

    fn view(&self, range: &Range) -> ViewResult<VectorView> {
        VectorView::new(self.root.clone(), self.compose(range)?)
    }

    fn persist(&self) -> Persisted {
        Persisted::view(self.root.persist(), &self.range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::ValueTypeDesc;
    use crate::range::{list, Range1DGroup};
    use crate::vector::VectorExt;
    use crate::ViewError;

    fn letters() -> Vector {
        let desc = DatasetDesc::vector("letters", 6, ValueTypeDesc::String);
        let names: Vec<String> = (0..6).map(|i| format!("n{i}")).collect();
        let data = ["f", "a", "e", "b", "d", "c"].into_iter().map(Value::from).collect();
        Vector::wrap(desc, names, (0..6).collect(), data).unwrap()
    }

    async fn all_data(v: &impl VectorData) -> Vec<Value> {
        v.data(&Range::all()).await.unwrap()
    }

    #[tokio::test]
    async fn nested_views_compose_by_index_translation() {
        let root = letters();
        let a = list([5, 4, 3, 2, 1]);
        let b = list([4, 0, 2]);
        let nested = root.view(&a).unwrap().view(&b).unwrap();
        let composed = a.pre_multiply(&b, &[6]).unwrap();
        assert_eq!(nested.range(), &composed);
        let direct = composed.filter(&all_data(&root).await).unwrap();
        assert_eq!(all_data(&nested).await, direct);
        assert_eq!(nested.len(), 3);
        assert_eq!(nested.at(0).await.unwrap(), Value::from("a"));
        assert_eq!(nested.names(&list([1])).await.unwrap(), vec!["n5"]);
    }

    #[tokio::test]
    async fn out_of_bounds_views_fail_fast() {
        let view = letters().view(&list([1, 2])).unwrap();
        let err = view.view(&list([2])).unwrap_err();
        assert!(matches!(err, ViewError::OutOfBounds { .. }));
        assert!(view.at(2).await.is_err());
    }

    #[tokio::test]
    async fn sort_and_filter_leave_root_untouched() {
        let root = letters();
        let other = root.view(&list([0, 1])).unwrap();
        let sorted = root.view(&list([0, 2, 4])).unwrap().sort().await.unwrap();
        assert_eq!(
            all_data(&sorted).await,
            ["d", "e", "f"].into_iter().map(Value::from).collect::<Vec<_>>()
        );
        assert_eq!(sorted.range(), &list([4, 2, 0]));
        let filtered = sorted
            .filter(|v, _| v != &Value::from("e"))
            .await
            .unwrap();
        assert_eq!(filtered.range(), &list([4, 0]));
        assert_eq!(all_data(&root).await[0], Value::from("f"));
        assert_eq!(
            all_data(&other).await,
            vec![Value::from("f"), Value::from("a")]
        );
    }

    #[tokio::test]
    async fn composite_views_keep_groups() {
        let root = letters();
        let grouped = crate::range::composite(
            "g",
            [
                Range1DGroup::new("x", "red", [1, 3]),
                Range1DGroup::new("y", "blue", [5]),
            ],
        );
        let view = root.view(&Range::from(grouped)).unwrap();
        assert_eq!(view.len(), 3);
        assert_eq!(
            all_data(&view).await,
            ["a", "b", "c"].into_iter().map(Value::from).collect::<Vec<_>>()
        );
        assert!(view.range().dim_or_all(0).as_composite().is_some());
    }

    #[tokio::test]
    async fn persists_as_root_and_range() {
        let view = letters().view(&list([3, 1])).unwrap();
        let p = view.persist();
        assert_eq!(p.root_id(), "letters");
        assert_eq!(
            p.to_json().unwrap(),
            serde_json::json!({"root": "letters", "range": "(3,1)"})
        );
        assert_eq!(view.stats().await.unwrap(), None);
        assert_eq!(view.hist(None, &Range::all()).await.unwrap(), None);
    }

    struct Offline;

    fn offline(desc: &DatasetDesc) -> ViewError {
        ViewError::loader(
            desc.id.clone(),
            std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "offline"),
        )
    }

    #[async_trait]
    impl crate::backend::VectorLoader for Offline {
        async fn rows(&self, desc: &DatasetDesc, _range: &Range) -> ViewResult<Vec<String>> {
            Err(offline(desc))
        }

        async fn ids(&self, desc: &DatasetDesc, _range: &Range) -> ViewResult<Range> {
            Err(offline(desc))
        }

        async fn data(&self, desc: &DatasetDesc, _range: &Range) -> ViewResult<Vec<Value>> {
            Err(offline(desc))
        }
    }

    #[tokio::test]
    async fn loader_failures_reach_the_caller_through_views() {
        let root = Vector::create(
            DatasetDesc::vector("remote", 4, ValueTypeDesc::real()),
            Arc::new(Offline),
        );
        let view = root.view(&list([3, 1, 2])).unwrap().view(&list([0, 2])).unwrap();
        for err in [
            view.data(&Range::all()).await.unwrap_err(),
            view.names(&Range::all()).await.unwrap_err(),
            view.at(1).await.unwrap_err(),
            view.stats().await.unwrap_err(),
        ] {
            assert!(!err.is_input_error());
            match err {
                ViewError::Loader { dataset, source } => {
                    assert_eq!(dataset, "remote");
                    assert_eq!(source.to_string(), "offline");
                }
                other => panic!("unexpected error: {other}"),
            }
        }
    }
}
