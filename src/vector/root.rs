use std::sync::Arc;

use async_trait::async_trait;
use snafu::prelude::*;
use tracing::trace;

use super::traits::VectorData;
use super::view::VectorView;
use crate::backend::{MemoryLoader, VectorLoader, VectorPayload};
use crate::error::{OutOfBoundsSnafu, ViewResult};
use crate::meta::{DatasetDesc, IdType, IdTypeResolver, Value};
use crate::persist::Persisted;
use crate::range::Range;

/// Root vector: a dataset description bound to a loader.
///
/// Cloning is cheap and clones share the loader.
#[derive(Clone)]
pub struct Vector {
    inner: Arc<VectorInner>,
}

struct VectorInner {
    desc: DatasetDesc,
    idtype: Arc<IdType>,
    loader: Arc<dyn VectorLoader>,
}

impl std::fmt::Debug for Vector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vector")
            .field("id", &self.inner.desc.id)
            .field("len", &self.len())
            .finish()
    }
}

impl Vector {
    pub fn create(desc: DatasetDesc, loader: Arc<dyn VectorLoader>) -> Self {
        let idtype = Arc::new(IdType::new(desc.idtype.clone()));
        Self::from_parts(desc, idtype, loader)
    }

    /// Like [`Vector::create`], resolving the identity type through `resolver`.
    pub fn with_resolver(
        desc: DatasetDesc,
        loader: Arc<dyn VectorLoader>,
        resolver: &dyn IdTypeResolver,
    ) -> Self {
        let idtype = resolver.resolve(&desc.idtype);
        Self::from_parts(desc, idtype, loader)
    }

    /// Root over in-memory names, ids and values.
    pub fn wrap(
        desc: DatasetDesc,
        rows: Vec<String>,
        row_ids: Vec<usize>,
        data: Vec<Value>,
    ) -> ViewResult<Self> {
        let payload = VectorPayload::new(rows, row_ids, data)?;
        Ok(Self::create(desc, Arc::new(MemoryLoader::new(payload))))
    }

    fn from_parts(desc: DatasetDesc, idtype: Arc<IdType>, loader: Arc<dyn VectorLoader>) -> Self {
        Self {
            inner: Arc::new(VectorInner {
                desc,
                idtype,
                loader,
            }),
        }
    }

    pub fn loader(&self) -> &Arc<dyn VectorLoader> {
        &self.inner.loader
    }
}

#[async_trait]
impl VectorData for Vector {
    fn desc(&self) -> &DatasetDesc {
        &self.inner.desc
    }

    fn len(&self) -> usize {
        self.inner.desc.len()
    }

    fn idtype(&self) -> Arc<IdType> {
        self.inner.idtype.clone()
    }

    async fn names(&self, range: &Range) -> ViewResult<Vec<String>> {
        self.inner.loader.rows(&self.inner.desc, range).await
    }

    async fn ids(&self, range: &Range) -> ViewResult<Range> {
        self.inner.loader.ids(&self.inner.desc, range).await
    }

    async fn data(&self, range: &Range) -> ViewResult<Vec<Value>> {
        trace!(dataset = %self.inner.desc.id, range = %range, "root vector data");
        let data = self.inner.loader.data(&self.inner.desc, range).await?;
        Ok(self.inner.desc.value.mask(data))
    }

    async fn at(&self, index: usize) -> ViewResult<Value> {
        let extent = self.len();
        ensure!(index < extent, OutOfBoundsSnafu { index, extent });
        let data = self.data(&Range::list([index])).await?;
        Ok(data.into_iter().next().unwrap_or(Value::Missing))
    }

    fn view(&self, range: &Range) -> ViewResult<VectorView> {
        VectorView::new(self.clone(), Range::all().pre_multiply(range, &[self.len()])?)
    }

    fn persist(&self) -> Persisted {
        Persisted::id(self.inner.desc.id.clone())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::meta::{IdTypeRegistry, ValueTypeDesc};
    use crate::range::list;
    use crate::vector::VectorExt;
    use crate::ViewError;

    fn numbers() -> Vector {
        let desc = DatasetDesc::vector(
            "num",
            5,
            ValueTypeDesc::Real {
                range: None,
                missing: Some(-1.0),
            },
        );
        Vector::wrap(
            desc,
            ["a", "b", "c", "d", "e"].iter().map(|s| s.to_string()).collect(),
            vec![10, 11, 12, 13, 14],
            vec![3.0.into(), 1.0.into(), (-1.0).into(), 5.0.into(), 2.0.into()],
        )
        .unwrap()
    }

    #[tokio::test]
    async fn masks_missing_sentinel() {
        let v = numbers();
        assert_eq!(v.at(2).await.unwrap(), Value::Missing);
        let stats = v.stats().await.unwrap().unwrap();
        assert_eq!(stats.count, 4);
        assert_eq!(stats.nans, 1);
        assert_eq!(stats.max, 5.0);
    }

    #[tokio::test]
    async fn at_checks_bounds() {
        let err = numbers().at(5).await.unwrap_err();
        assert!(matches!(err, ViewError::OutOfBounds { index: 5, extent: 5 }));
    }

    #[tokio::test]
    async fn traversal_follows_logical_order() {
        let v = numbers();
        let seen = v
            .reduce(|mut acc: Vec<usize>, _, i| {
                acc.push(i);
                acc
            }, Vec::new())
            .await
            .unwrap();
        assert_eq!(seen, vec![0, 1, 2, 3, 4]);
        let last = v
            .reduce_right(|acc: Option<f64>, x, _| acc.or(x.as_f64()), None)
            .await
            .unwrap();
        assert_eq!(last, Some(2.0));
        assert!(v.some(|x, _| x.is_missing()).await.unwrap());
        assert!(!v.every(|x, _| x.as_f64().is_some()).await.unwrap());
        let mut count = 0;
        v.for_each(|_, _| count += 1).await.unwrap();
        assert_eq!(count, 5);
    }

    #[tokio::test]
    async fn id_view_maps_identifiers_to_positions() {
        let v = numbers();
        let view = v.id_view(&list([14, 10, 99])).await.unwrap();
        assert_eq!(view.names(&Range::all()).await.unwrap(), vec!["e", "a"]);
    }

    #[tokio::test]
    async fn restore_without_range_is_the_root() {
        let v = numbers();
        let same = v.restore(&json!({})).await.unwrap();
        assert_eq!(same.persist(), v.persist());
        let sub = v.restore(&json!({"range": "(4,0)"})).await.unwrap();
        assert_eq!(sub.data(&Range::all()).await.unwrap(), vec![2.0.into(), 3.0.into()]);
        assert!(v.restore(&json!({"range": "(4,"})).await.is_err());
    }

    #[test]
    fn resolver_shares_identity_types() {
        let registry = IdTypeRegistry::new();
        let desc = DatasetDesc::vector("x", 0, ValueTypeDesc::real());
        let payload = VectorPayload::default();
        let a = Vector::with_resolver(
            desc.clone(),
            Arc::new(MemoryLoader::new(payload.clone())),
            &registry,
        );
        let b = Vector::with_resolver(desc, Arc::new(MemoryLoader::new(payload)), &registry);
        assert!(Arc::ptr_eq(&a.idtype(), &b.idtype()));
        assert!(a.is_empty());
    }
}
