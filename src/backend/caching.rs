//! Memoizing loaders.
//!
//! A [`PayloadSource`] fetches the whole payload of a dataset once; the
//! [`CachingLoader`] keeps it in a moka cache keyed by dataset id and
//! serves every range request from the cached copy.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use moka::future::Cache;
use tracing::{debug, trace};

use super::memory::{MatrixPayload, VectorPayload};
use super::traits::{MatrixLoader, VectorLoader};
use crate::config::CacheConfig;
use crate::error::ViewResult;
use crate::meta::{DatasetDesc, Value};
use crate::range::Range;

/// Transport that fetches a complete dataset payload.
#[async_trait]
pub trait PayloadSource<P>: Send + Sync {
    async fn fetch(&self, desc: &DatasetDesc) -> ViewResult<P>;
}

/// Loader that fetches each dataset once and answers range requests from
/// the memoized payload.
///
/// Failed fetches are not cached and their errors reach the caller as
/// returned by the source.
pub struct CachingLoader<P, S> {
    source: S,
    payloads: Cache<String, Arc<P>>,
    _payload: PhantomData<fn() -> P>,
}

impl<P, S> CachingLoader<P, S>
where
    P: Send + Sync + 'static,
    S: PayloadSource<P>,
{
    pub fn new(source: S, config: &CacheConfig) -> Self {
        Self {
            source,
            payloads: Cache::builder()
                .max_capacity(config.max_capacity)
                .build(),
            _payload: PhantomData,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Payload of `desc`, fetched on first access.
    pub async fn payload(&self, desc: &DatasetDesc) -> ViewResult<Arc<P>> {
        if let Some(payload) = self.payloads.get(&desc.id).await {
            trace!(dataset = %desc.id, "payload cache hit");
            return Ok(payload);
        }
        debug!(dataset = %desc.id, "payload cache miss, fetching");
        let payload = Arc::new(self.source.fetch(desc).await?);
        self.payloads
            .insert(desc.id.clone(), payload.clone())
            .await;
        Ok(payload)
    }

    /// Drop the memoized payload of `id`.
    pub async fn invalidate(&self, id: &str) {
        debug!(dataset = %id, "invalidating payload");
        self.payloads.invalidate(id).await;
    }

    /// Number of memoized payloads.
    pub async fn cached(&self) -> u64 {
        self.payloads.run_pending_tasks().await;
        self.payloads.entry_count()
    }
}

#[async_trait]
impl<S> VectorLoader for CachingLoader<VectorPayload, S>
where
    S: PayloadSource<VectorPayload>,
{
    async fn rows(&self, desc: &DatasetDesc, range: &Range) -> ViewResult<Vec<String>> {
        self.payload(desc).await?.select_rows(range)
    }

    async fn ids(&self, desc: &DatasetDesc, range: &Range) -> ViewResult<Range> {
        self.payload(desc).await?.select_ids(range)
    }

    async fn data(&self, desc: &DatasetDesc, range: &Range) -> ViewResult<Vec<Value>> {
        trace!(dataset = %desc.id, range = %range, "vector data");
        self.payload(desc).await?.select_data(range)
    }
}

#[async_trait]
impl<S> MatrixLoader for CachingLoader<MatrixPayload, S>
where
    S: PayloadSource<MatrixPayload>,
{
    async fn rows(&self, desc: &DatasetDesc, range: &Range) -> ViewResult<Vec<String>> {
        self.payload(desc).await?.select_rows(range)
    }

    async fn row_ids(&self, desc: &DatasetDesc, range: &Range) -> ViewResult<Range> {
        self.payload(desc).await?.select_row_ids(range)
    }

    async fn cols(&self, desc: &DatasetDesc, range: &Range) -> ViewResult<Vec<String>> {
        self.payload(desc).await?.select_cols(range)
    }

    async fn col_ids(&self, desc: &DatasetDesc, range: &Range) -> ViewResult<Range> {
        self.payload(desc).await?.select_col_ids(range)
    }

    async fn data(&self, desc: &DatasetDesc, range: &Range) -> ViewResult<Vec<Vec<Value>>> {
        trace!(dataset = %desc.id, range = %range, "matrix data");
        self.payload(desc).await?.select_data(range)
    }

    async fn at(&self, desc: &DatasetDesc, row: usize, col: usize) -> ViewResult<Value> {
        self.payload(desc).await?.cell(row, col)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::meta::ValueTypeDesc;
    use crate::range::list;
    use crate::ViewError;

    struct CountingSource {
        fetches: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl PayloadSource<VectorPayload> for CountingSource {
        async fn fetch(&self, desc: &DatasetDesc) -> ViewResult<VectorPayload> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ViewError::loader(
                    desc.id.clone(),
                    std::io::Error::new(std::io::ErrorKind::TimedOut, "timeout"),
                ));
            }
            VectorPayload::new(
                vec!["a".into(), "b".into()],
                vec![0, 1],
                vec![1.5.into(), 2.5.into()],
            )
        }
    }

    fn source(fail: bool) -> CountingSource {
        CountingSource {
            fetches: AtomicUsize::new(0),
            fail,
        }
    }

    #[tokio::test]
    async fn fetches_each_dataset_once() {
        let loader = CachingLoader::new(source(false), &CacheConfig::default());
        let desc = DatasetDesc::vector("v0", 2, ValueTypeDesc::real());
        let data = loader.data(&desc, &list([1])).await.unwrap();
        assert_eq!(data, vec![Value::Real(2.5)]);
        assert_eq!(loader.rows(&desc, &Range::all()).await.unwrap(), vec!["a", "b"]);
        assert_eq!(loader.ids(&desc, &list([0])).await.unwrap(), list([0]));
        assert_eq!(loader.source().fetches.load(Ordering::SeqCst), 1);
        assert_eq!(loader.cached().await, 1);

        loader.invalidate("v0").await;
        loader.data(&desc, &Range::all()).await.unwrap();
        assert_eq!(loader.source().fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failures_propagate_and_are_not_cached() {
        let loader = CachingLoader::new(source(true), &CacheConfig::default());
        let desc = DatasetDesc::vector("v1", 2, ValueTypeDesc::real());
        for _ in 0..2 {
            let err = loader.data(&desc, &Range::all()).await.unwrap_err();
            assert!(matches!(err, ViewError::Loader { ref dataset, .. } if dataset == "v1"));
        }
        assert_eq!(loader.source().fetches.load(Ordering::SeqCst), 2);
    }
}
