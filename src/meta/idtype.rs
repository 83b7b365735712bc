//! Identity types: what a row or column index semantically represents.

use std::fmt::{self, Display};
use std::sync::Arc;

use moka::sync::Cache as MokaCache;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdType {
    id: String,
}

impl IdType {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Internal identity types start with an underscore, e.g. `_rows`.
    pub fn is_internal(&self) -> bool {
        self.id.starts_with('_')
    }
}

impl Display for IdType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// Identity type of a matrix cell: the product of row and column types.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProductIdType {
    elems: [Arc<IdType>; 2],
}

impl ProductIdType {
    pub fn new(row: Arc<IdType>, col: Arc<IdType>) -> Self {
        Self { elems: [row, col] }
    }

    pub fn elems(&self) -> &[Arc<IdType>; 2] {
        &self.elems
    }

    pub fn id(&self) -> String {
        format!("{}X{}", self.elems[0], self.elems[1])
    }
}

/// Resolves identity-type tags to canonical handles.
///
/// Implementations must be idempotent: resolving the same tag twice
/// yields equal handles.
pub trait IdTypeResolver: Send + Sync {
    fn resolve(&self, tag: &str) -> Arc<IdType>;

    fn resolve_product(&self, row: &Arc<IdType>, col: &Arc<IdType>) -> Arc<ProductIdType>;
}

/// In-process resolver that hands out one shared handle per tag.
#[derive(Clone)]
pub struct IdTypeRegistry {
    idtypes: MokaCache<String, Arc<IdType>>,
    products: MokaCache<(String, String), Arc<ProductIdType>>,
}

impl Default for IdTypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl IdTypeRegistry {
    pub fn new() -> Self {
        Self {
            idtypes: MokaCache::builder().build(),
            products: MokaCache::builder().build(),
        }
    }
}

impl IdTypeResolver for IdTypeRegistry {
    fn resolve(&self, tag: &str) -> Arc<IdType> {
        self.idtypes
            .get_with(tag.to_string(), || Arc::new(IdType::new(tag)))
    }

    fn resolve_product(&self, row: &Arc<IdType>, col: &Arc<IdType>) -> Arc<ProductIdType> {
        let key = (row.id().to_string(), col.id().to_string());
        self.products.get_with(key, || {
            Arc::new(ProductIdType::new(row.clone(), col.clone()))
        })
    }
}
