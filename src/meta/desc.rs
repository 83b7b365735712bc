use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use super::value::ValueTypeDesc;
use crate::range::Shape;

/// Default identity type for rows of ad-hoc datasets.
pub const DEFAULT_ROWTYPE: &str = "_rows";
/// Default identity type for columns of ad-hoc datasets.
pub const DEFAULT_COLTYPE: &str = "_cols";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataKind {
    Vector,
    Matrix,
    Stratification,
}

/// Immutable record identifying a dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetDesc {
    pub id: String,
    pub name: String,
    pub fqname: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub creator: String,
    /// Creation time, milliseconds since the unix epoch.
    #[serde(default)]
    pub ts: u64,
    #[serde(rename = "type")]
    pub kind: DataKind,
    pub value: ValueTypeDesc,
    pub size: Shape,
    /// Identity type of the first axis.
    #[serde(rename = "rowtype", alias = "idtype")]
    pub idtype: String,
    /// Identity type of the second axis (matrices only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coltype: Option<String>,
}

static DEFAULT_IDS: AtomicUsize = AtomicUsize::new(0);

pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

impl DatasetDesc {
    pub fn vector(id: impl Into<String>, len: usize, value: ValueTypeDesc) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            fqname: id.clone(),
            id,
            description: String::new(),
            creator: String::new(),
            ts: now_millis(),
            kind: DataKind::Vector,
            value,
            size: smallvec::smallvec![len],
            idtype: DEFAULT_ROWTYPE.to_string(),
            coltype: None,
        }
    }

    pub fn matrix(
        id: impl Into<String>,
        rows: usize,
        cols: usize,
        value: ValueTypeDesc,
    ) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            fqname: id.clone(),
            id,
            description: String::new(),
            creator: String::new(),
            ts: now_millis(),
            kind: DataKind::Matrix,
            value,
            size: smallvec::smallvec![rows, cols],
            idtype: DEFAULT_ROWTYPE.to_string(),
            coltype: Some(DEFAULT_COLTYPE.to_string()),
        }
    }

    /// Matrix description with a generated id, used for ad-hoc tables.
    pub fn default_matrix() -> Self {
        let n = DEFAULT_IDS.fetch_add(1, Ordering::Relaxed);
        let mut desc =
            Self::matrix(format!("matrix{n}"), 0, 0, ValueTypeDesc::real());
        desc.name = "Matrix".to_string();
        desc.fqname = "Matrix".to_string();
        desc
    }

    pub fn with_idtypes(mut self, rowtype: impl Into<String>, coltype: Option<String>) -> Self {
        self.idtype = rowtype.into();
        self.coltype = coltype;
        self
    }

    /// Length of the first axis.
    pub fn len(&self) -> usize {
        self.size.first().copied().unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn coltype(&self) -> &str {
        self.coltype.as_deref().unwrap_or(DEFAULT_COLTYPE)
    }
}
