//! Dataset descriptions and the registry that turns persisted views back
//! into live ones.

mod memory;
mod registry;

use async_trait::async_trait;

use crate::error::ViewResult;
use crate::meta::DatasetDesc;

pub use memory::MemoryDescriptionStore;
pub use registry::DatasetRegistry;

/// Lookup of dataset descriptions by id.
#[async_trait]
pub trait DescriptionStore: Send + Sync {
    /// Fails with `UnknownDataset` when `id` is not stored.
    async fn get(&self, id: &str) -> ViewResult<DatasetDesc>;

    async fn list(&self) -> ViewResult<Vec<DatasetDesc>>;
}
