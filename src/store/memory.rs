use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use snafu::prelude::*;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::DescriptionStore;
use crate::config::StoreConfig;
use crate::error::{UnknownDatasetSnafu, UnsupportedPersistedSnafu, ViewResult};
use crate::meta::{now_millis, DatasetDesc};

#[derive(Default)]
struct Entries {
    /// Ids in creation order.
    order: Vec<String>,
    descs: BTreeMap<String, DatasetDesc>,
}

/// In-process description store with prefix-numbered ids.
///
/// Thread-safe via `tokio::sync::RwLock`.
pub struct MemoryDescriptionStore {
    prefix: String,
    entries: RwLock<Entries>,
}

impl MemoryDescriptionStore {
    pub fn new(config: &StoreConfig) -> Self {
        Self {
            prefix: config.prefix.clone(),
            entries: RwLock::new(Entries::default()),
        }
    }

    fn next_id(&self, entries: &Entries) -> String {
        let next = entries
            .order
            .iter()
            .filter_map(|id| id.strip_prefix(self.prefix.as_str()))
            .filter_map(|n| n.parse::<u64>().ok())
            .max()
            .map_or(0, |n| n + 1);
        format!("{}{next}", self.prefix)
    }

    /// Store `template` under a freshly generated id.
    ///
    /// An empty name defaults to the id; the creation time is set to now.
    pub async fn create(&self, template: DatasetDesc) -> DatasetDesc {
        let mut entries = self.entries.write().await;
        let id = self.next_id(&entries);
        let mut desc = template;
        if desc.name.is_empty() {
            desc.name = id.clone();
        }
        desc.fqname = format!("{}/{}", self.prefix, desc.name);
        desc.id = id.clone();
        desc.ts = now_millis();
        entries.order.push(id.clone());
        entries.descs.insert(id, desc.clone());
        info!(dataset = %desc.id, kind = ?desc.kind, "created description");
        desc
    }

    /// Store `desc` under its own id, replacing any previous entry.
    pub async fn insert(&self, desc: DatasetDesc) {
        let mut entries = self.entries.write().await;
        if !entries.descs.contains_key(&desc.id) {
            entries.order.push(desc.id.clone());
        }
        debug!(dataset = %desc.id, "stored description");
        entries.descs.insert(desc.id.clone(), desc);
    }

    /// Merge the fields of the JSON object `patch` into the description
    /// of `id`. The id itself cannot be changed.
    pub async fn edit(&self, id: &str, patch: &JsonValue) -> ViewResult<DatasetDesc> {
        let JsonValue::Object(fields) = patch else {
            return UnsupportedPersistedSnafu {
                what: "description patch",
                persisted: patch.to_string(),
            }
            .fail();
        };
        let mut entries = self.entries.write().await;
        let current = entries
            .descs
            .get(id)
            .context(UnknownDatasetSnafu { id })?;
        let mut merged = serde_json::to_value(current)?;
        if let JsonValue::Object(target) = &mut merged {
            for (key, value) in fields {
                if key != "id" {
                    target.insert(key.clone(), value.clone());
                }
            }
        }
        let desc: DatasetDesc = serde_json::from_value(merged)?;
        entries.descs.insert(id.to_string(), desc.clone());
        debug!(dataset = %id, "edited description");
        Ok(desc)
    }

    /// Remove `id`; false when it was not stored.
    pub async fn delete(&self, id: &str) -> bool {
        let mut entries = self.entries.write().await;
        let removed = entries.descs.remove(id).is_some();
        entries.order.retain(|known| known != id);
        if removed {
            info!(dataset = %id, "deleted description");
        }
        removed
    }
}

#[async_trait]
impl DescriptionStore for MemoryDescriptionStore {
    async fn get(&self, id: &str) -> ViewResult<DatasetDesc> {
        let entries = self.entries.read().await;
        entries
            .descs
            .get(id)
            .cloned()
            .context(UnknownDatasetSnafu { id })
    }

    async fn list(&self) -> ViewResult<Vec<DatasetDesc>> {
        let entries = self.entries.read().await;
        Ok(entries
            .order
            .iter()
            .filter_map(|id| entries.descs.get(id).cloned())
            .collect())
    }
}
