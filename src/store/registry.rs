//! Live datasets bound to loaders, and restoration of persisted views.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use snafu::prelude::*;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::DescriptionStore;
use crate::backend::{MatrixLoader, VectorLoader};
use crate::config::Config;
use crate::error::{UnknownDatasetSnafu, UnsupportedPersistedSnafu, ViewResult};
use crate::matrix::{Matrix, MatrixData, MatrixView, TableOptions};
use crate::meta::{DataKind, DatasetDesc, IdTypeRegistry, IdTypeResolver, Value};
use crate::persist::Persisted;
use crate::range;
use crate::vector::{Stratification, Vector, VectorData, VectorView};

/// Injected handle combining the identity-type resolver, the description
/// store and the roots created through it.
///
/// Ids that were never created here are resolved through the store and
/// bound to the fallback loaders, when configured.
pub struct DatasetRegistry {
    config: Config,
    resolver: Arc<dyn IdTypeResolver>,
    store: Arc<dyn DescriptionStore>,
    vector_loader: Option<Arc<dyn VectorLoader>>,
    matrix_loader: Option<Arc<dyn MatrixLoader>>,
    vectors: RwLock<HashMap<String, Vector>>,
    matrices: RwLock<HashMap<String, Matrix>>,
}

impl DatasetRegistry {
    pub fn new(store: Arc<dyn DescriptionStore>) -> Self {
        Self::with_config(store, Config::default())
    }

    pub fn with_config(store: Arc<dyn DescriptionStore>, config: Config) -> Self {
        Self {
            config,
            resolver: Arc::new(IdTypeRegistry::new()),
            store,
            vector_loader: None,
            matrix_loader: None,
            vectors: RwLock::new(HashMap::new()),
            matrices: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn IdTypeResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Loaders used for ids known only to the store.
    pub fn with_loaders(
        mut self,
        vector_loader: Option<Arc<dyn VectorLoader>>,
        matrix_loader: Option<Arc<dyn MatrixLoader>>,
    ) -> Self {
        self.vector_loader = vector_loader;
        self.matrix_loader = matrix_loader;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn resolver(&self) -> &Arc<dyn IdTypeResolver> {
        &self.resolver
    }

    pub fn store(&self) -> &Arc<dyn DescriptionStore> {
        &self.store
    }

    pub async fn create_vector(&self, desc: DatasetDesc, loader: Arc<dyn VectorLoader>) -> Vector {
        let vector = Vector::with_resolver(desc, loader, self.resolver.as_ref());
        debug!(dataset = %vector.desc().id, "registered vector");
        self.vectors
            .write()
            .await
            .insert(vector.desc().id.clone(), vector.clone());
        vector
    }

    pub async fn create_matrix(&self, desc: DatasetDesc, loader: Arc<dyn MatrixLoader>) -> Matrix {
        let matrix = Matrix::with_resolver(desc, loader, self.resolver.as_ref());
        debug!(dataset = %matrix.desc().id, "registered matrix");
        self.matrices
            .write()
            .await
            .insert(matrix.desc().id.clone(), matrix.clone());
        matrix
    }

    /// [`Matrix::from_table`] with the configured sample size, registered
    /// under its generated id.
    pub async fn from_table(
        &self,
        table: Vec<Vec<Value>>,
        options: TableOptions,
    ) -> ViewResult<Matrix> {
        let options = TableOptions {
            inference: self.config.inference.clone(),
            ..options
        };
        let adhoc = Matrix::from_table(table, options)?;
        Ok(self
            .create_matrix(adhoc.desc().clone(), adhoc.loader().clone())
            .await)
    }

    /// Root vector of `id`.
    pub async fn vector(&self, id: &str) -> ViewResult<Vector> {
        if let Some(v) = self.vectors.read().await.get(id) {
            return Ok(v.clone());
        }
        let desc = self.store.get(id).await?;
        ensure!(
            desc.kind == DataKind::Vector,
            UnsupportedPersistedSnafu {
                what: "vector",
                persisted: format!("{id} ({:?})", desc.kind),
            }
        );
        let loader = self
            .vector_loader
            .clone()
            .context(UnknownDatasetSnafu { id })?;
        info!(dataset = %id, "binding stored vector to fallback loader");
        Ok(self.create_vector(desc, loader).await)
    }

    /// Root matrix of `id`.
    pub async fn matrix(&self, id: &str) -> ViewResult<Matrix> {
        if let Some(m) = self.matrices.read().await.get(id) {
            return Ok(m.clone());
        }
        let desc = self.store.get(id).await?;
        ensure!(
            desc.kind == DataKind::Matrix,
            UnsupportedPersistedSnafu {
                what: "matrix",
                persisted: format!("{id} ({:?})", desc.kind),
            }
        );
        let loader = self
            .matrix_loader
            .clone()
            .context(UnknownDatasetSnafu { id })?;
        info!(dataset = %id, "binding stored matrix to fallback loader");
        Ok(self.create_matrix(desc, loader).await)
    }

    /// Live vector view for a persisted root, view or stratification group.
    pub fn restore_vector<'a>(
        &'a self,
        persisted: &'a Persisted,
    ) -> BoxFuture<'a, ViewResult<VectorView>> {
        async move {
            debug!(persisted = ?persisted, "restoring vector");
            match persisted {
                Persisted::Id(id) => self.vector(id).await?.view(&range::all()),
                Persisted::View { root, range: text } => self
                    .restore_vector(root)
                    .await?
                    .view(&range::parse(text.as_str())?),
                Persisted::Group { root, group } => {
                    self.restore_stratification(root).await?.group(*group)?.vector()
                }
                other => unsupported("vector", other),
            }
        }
        .boxed()
    }

    pub fn restore_stratification<'a>(
        &'a self,
        persisted: &'a Persisted,
    ) -> BoxFuture<'a, ViewResult<Stratification>> {
        async move {
            match persisted {
                Persisted::Stratification { root, asstrat: true } => {
                    self.restore_vector(root).await?.as_stratification().await
                }
                other => unsupported("stratification", other),
            }
        }
        .boxed()
    }

    /// Live matrix view for a persisted root, view or transpose.
    pub fn restore_matrix<'a>(
        &'a self,
        persisted: &'a Persisted,
    ) -> BoxFuture<'a, ViewResult<MatrixView>> {
        async move {
            debug!(persisted = ?persisted, "restoring matrix");
            match persisted {
                Persisted::Id(id) => self.matrix(id).await?.view(&range::all()),
                Persisted::View { root, range: text } => self
                    .restore_matrix(root)
                    .await?
                    .view(&range::parse(text.as_str())?),
                Persisted::Transposed { root, transposed } => {
                    let base = self.restore_matrix(root).await?;
                    if *transposed {
                        base.t().view(&range::all())
                    } else {
                        Ok(base)
                    }
                }
                other => unsupported("matrix", other),
            }
        }
        .boxed()
    }
}

fn unsupported<T>(what: &str, persisted: &Persisted) -> ViewResult<T> {
    UnsupportedPersistedSnafu {
        what,
        persisted: persisted
            .to_json()
            .map(|j| j.to_string())
            .unwrap_or_else(|_| format!("{persisted:?}")),
    }
    .fail()
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::backend::{CachingLoader, MatrixPayload, PayloadSource};
    use crate::meta::ValueTypeDesc;
    use crate::range::Range;
    use crate::store::MemoryDescriptionStore;
    use crate::ViewError;

    fn registry() -> (Arc<MemoryDescriptionStore>, DatasetRegistry) {
        let store = Arc::new(MemoryDescriptionStore::new(&Default::default()));
        let registry = DatasetRegistry::new(store.clone());
        (store, registry)
    }

    async fn letters(registry: &DatasetRegistry) -> Vector {
        let desc = DatasetDesc::vector("v0", 4, ValueTypeDesc::categorical(["a", "b"]));
        let adhoc = Vector::wrap(
            desc,
            vec!["w".into(), "x".into(), "y".into(), "z".into()],
            vec![0, 1, 2, 3],
            vec!["a".into(), "b".into(), "a".into(), "b".into()],
        )
        .unwrap();
        registry
            .create_vector(adhoc.desc().clone(), adhoc.loader().clone())
            .await
    }

    #[tokio::test]
    async fn vector_views_survive_a_round_trip() {
        let (_, registry) = registry();
        let v = letters(&registry).await;
        let view = v.view(&range::list([3, 1, 0])).unwrap().view(&range::list([0, 2])).unwrap();

        let json = view.persist().to_json().unwrap();
        assert_eq!(json, json!({"root": "v0", "range": "(3,0)"}));
        let restored = registry
            .restore_vector(&Persisted::from_json(&json).unwrap())
            .await
            .unwrap();
        assert_eq!(restored.names(&Range::all()).await.unwrap(), vec!["z", "w"]);

        let root = registry.restore_vector(&Persisted::id("v0")).await.unwrap();
        assert_eq!(root.persist(), Persisted::id("v0"));
    }

    #[tokio::test]
    async fn stratification_groups_round_trip() {
        let (_, registry) = registry();
        let v = letters(&registry).await;
        let strat = v.as_stratification().await.unwrap();
        let group = strat.group(1).unwrap();

        let json = group.persist().to_json().unwrap();
        assert_eq!(json, json!({"root": {"root": "v0", "asstrat": true}, "group": 1}));
        let restored = registry
            .restore_vector(&Persisted::from_json(&json).unwrap())
            .await
            .unwrap();
        assert_eq!(restored.names(&Range::all()).await.unwrap(), vec!["x", "z"]);

        let again = registry.restore_stratification(&strat.persist()).await.unwrap();
        assert_eq!(again.ngroups(), 2);
    }

    struct Table {
        fetches: AtomicUsize,
    }

    #[async_trait]
    impl PayloadSource<MatrixPayload> for Table {
        async fn fetch(&self, _desc: &DatasetDesc) -> ViewResult<MatrixPayload> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            MatrixPayload::new(
                vec!["r0".into(), "r1".into()],
                vec![0, 1],
                vec!["c0".into(), "c1".into(), "c2".into()],
                vec![0, 1, 2],
                vec![
                    vec![1.0.into(), 2.0.into(), 3.0.into()],
                    vec![4.0.into(), 5.0.into(), 6.0.into()],
                ],
            )
        }
    }

    #[tokio::test]
    async fn stored_matrices_bind_to_the_fallback_loader() {
        let store = Arc::new(MemoryDescriptionStore::new(&Default::default()));
        store
            .insert(DatasetDesc::matrix("m0", 2, 3, ValueTypeDesc::real()))
            .await;
        let loader = Arc::new(CachingLoader::<MatrixPayload, _>::new(
            Table {
                fetches: AtomicUsize::new(0),
            },
            &Default::default(),
        ));
        let registry =
            DatasetRegistry::new(store).with_loaders(None, Some(loader.clone() as Arc<dyn MatrixLoader>));

        let persisted = Persisted::from_json(&json!({
            "root": {"root": "m0", "transposed": true},
            "range": "(2)"
        }))
        .unwrap();
        let view = registry.restore_matrix(&persisted).await.unwrap();
        assert_eq!(view.shape().as_slice(), &[1, 2]);
        assert_eq!(
            view.data(&Range::all()).await.unwrap(),
            vec![vec![Value::Real(3.0), Value::Real(6.0)]]
        );
        assert_eq!(view.persist(), persisted);

        registry.restore_matrix(&Persisted::id("m0")).await.unwrap();
        assert_eq!(loader.source().fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unknown_and_mismatched_forms_are_rejected() {
        let (store, registry) = registry();
        let err = registry.restore_vector(&Persisted::id("nope")).await.unwrap_err();
        assert!(matches!(err, ViewError::UnknownDataset { .. }));

        let transposed = Persisted::Transposed {
            root: Box::new(Persisted::id("v0")),
            transposed: true,
        };
        let err = registry.restore_vector(&transposed).await.unwrap_err();
        assert!(matches!(err, ViewError::UnsupportedPersisted { .. }));

        // Known to the store but no loader to bind it to.
        let desc = store
            .create(DatasetDesc::vector("", 2, ValueTypeDesc::real()))
            .await;
        let err = registry.vector(&desc.id).await.unwrap_err();
        assert!(matches!(err, ViewError::UnknownDataset { .. }));
        let err = registry.matrix(&desc.id).await.unwrap_err();
        assert!(matches!(err, ViewError::UnsupportedPersisted { .. }));
    }

    #[tokio::test]
    async fn tables_use_the_configured_inference() {
        let (_, registry) = registry();
        let table = vec![
            vec![Value::from("_"), Value::from("c")],
            vec![Value::from("r"), Value::Int(1)],
        ];
        let m = registry.from_table(table, TableOptions::default()).await.unwrap();
        let again = registry.matrix(&m.desc().id).await.unwrap();
        assert_eq!(again.at(0, 0).await.unwrap(), Value::Real(1.0));
    }
}
