//! JSON form of roots, views and derived datasets.
//!
//! ```text
//! "ds0"                                    root
//! {"root": "ds0", "range": "(0,2)"}        view
//! {"root": "ds0", "transposed": true}      transposed matrix
//! {"root": "ds0", "asstrat": true}         stratification of a vector
//! {"root": {..}, "group": 1}               one stratification group
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::ViewResult;
use crate::range::Range;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Persisted {
    Id(String),
    View {
        root: Box<Persisted>,
        range: String,
    },
    Transposed {
        root: Box<Persisted>,
        transposed: bool,
    },
    Stratification {
        root: Box<Persisted>,
        asstrat: bool,
    },
    Group {
        root: Box<Persisted>,
        group: usize,
    },
}

impl Persisted {
    pub fn id(id: impl Into<String>) -> Self {
        Persisted::Id(id.into())
    }

    /// `root` restricted to `range`; the all-range persists as `root` itself.
    pub fn view(root: Persisted, range: &Range) -> Self {
        if range.is_all() {
            return root;
        }
        Persisted::View {
            root: Box::new(root),
            range: range.to_string(),
        }
    }

    /// Id of the dataset at the bottom of the chain.
    pub fn root_id(&self) -> &str {
        match self {
            Persisted::Id(id) => id,
            Persisted::View { root, .. }
            | Persisted::Transposed { root, .. }
            | Persisted::Stratification { root, .. }
            | Persisted::Group { root, .. } => root.root_id(),
        }
    }

    pub fn to_json(&self) -> ViewResult<JsonValue> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn from_json(value: &JsonValue) -> ViewResult<Self> {
        Ok(Persisted::deserialize(value)?)
    }
}
