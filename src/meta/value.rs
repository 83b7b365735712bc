//! Cell values and declared value types.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

/// A single cell. JSON: `null`, a number, or a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Missing,
    Int(i64),
    Real(f64),
    Str(String),
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Missing => Ok(()),
            Value::Int(v) => write!(f, "{v}"),
            Value::Real(v) => write!(f, "{v}"),
            Value::Str(v) => f.write_str(v),
        }
    }
}

impl Value {
    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    /// Numeric reading; numeric strings are parsed.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Real(v) => Some(*v),
            Value::Str(s) => s.trim().parse().ok(),
            Value::Missing => None,
        }
    }

    /// Numeric reading with missing and non-numeric cells as NaN.
    pub fn to_f64_or_nan(&self) -> f64 {
        self.as_f64().unwrap_or(f64::NAN)
    }

    /// Name used to match this value against declared categories.
    pub fn category_name(&self) -> Option<String> {
        match self {
            Value::Missing => None,
            other => Some(other.to_string()),
        }
    }

    /// Natural order: numbers, then strings, then missing.
    pub fn natural_cmp(&self, other: &Value) -> Ordering {
        fn rank(v: &Value) -> u8 {
            match v {
                Value::Int(_) | Value::Real(_) => 0,
                Value::Str(_) => 1,
                Value::Missing => 2,
            }
        }
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Str(a), Value::Str(b)) => a.cmp(b),
            (a, b) if rank(a) == 0 && rank(b) == 0 => {
                a.to_f64_or_nan().total_cmp(&b.to_f64_or_nan())
            }
            (a, b) => rank(a).cmp(&rank(b)),
        }
    }
}

/// A declared category: a plain name or a name with display metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Category {
    Name(String),
    Detailed {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        color: Option<String>,
    },
}

impl From<&str> for Category {
    fn from(v: &str) -> Self {
        Category::Name(v.to_string())
    }
}

impl Category {
    pub fn name(&self) -> &str {
        match self {
            Category::Name(n) => n,
            Category::Detailed { name, .. } => name,
        }
    }

    pub fn label(&self) -> Option<&str> {
        match self {
            Category::Name(_) => None,
            Category::Detailed { label, .. } => label.as_deref(),
        }
    }

    pub fn color(&self) -> Option<&str> {
        match self {
            Category::Name(_) => None,
            Category::Detailed { color, .. } => color.as_deref(),
        }
    }
}

/// Declared value type of a dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ValueTypeDesc {
    Categorical {
        categories: Vec<Category>,
    },
    Real {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        range: Option<[f64; 2]>,
        /// Sentinel that marks a missing cell.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        missing: Option<f64>,
    },
    Int {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        range: Option<[f64; 2]>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        missing: Option<f64>,
    },
    /// Free-form unique objects; no statistics or histograms.
    String,
}

impl ValueTypeDesc {
    pub fn real() -> Self {
        ValueTypeDesc::Real {
            range: None,
            missing: None,
        }
    }

    pub fn int() -> Self {
        ValueTypeDesc::Int {
            range: None,
            missing: None,
        }
    }

    pub fn categorical(
        categories: impl IntoIterator<Item = impl Into<Category>>,
    ) -> Self {
        ValueTypeDesc::Categorical {
            categories: categories.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ValueTypeDesc::Real { .. } | ValueTypeDesc::Int { .. })
    }

    pub fn is_categorical(&self) -> bool {
        matches!(self, ValueTypeDesc::Categorical { .. })
    }

    pub fn numeric_range(&self) -> Option<[f64; 2]> {
        match self {
            ValueTypeDesc::Real { range, .. } | ValueTypeDesc::Int { range, .. } => *range,
            _ => None,
        }
    }

    pub fn categories(&self) -> &[Category] {
        match self {
            ValueTypeDesc::Categorical { categories } => categories,
            _ => &[],
        }
    }

    /// Replace cells equal to the declared missing sentinel.
    pub fn mask(&self, data: Vec<Value>) -> Vec<Value> {
        let sentinel = match self {
            ValueTypeDesc::Real { missing: Some(m), .. }
            | ValueTypeDesc::Int { missing: Some(m), .. } => *m,
            _ => return data,
        };
        data.into_iter()
            .map(|v| match v.as_f64() {
                Some(x) if x == sentinel => Value::Missing,
                _ => v,
            })
            .collect()
    }
}

/// Guess a value type from cell contents.
///
/// The first `sample_size` non-missing cells decide between numeric and
/// non-numeric; numeric types carry the extent over all cells.
pub fn guess_value_type(values: &[Value], sample_size: usize) -> ValueTypeDesc {
    let sample: Vec<&Value> = values
        .iter()
        .filter(|v| !v.is_missing())
        .take(sample_size.max(1))
        .collect();
    if sample.is_empty() {
        return ValueTypeDesc::String;
    }
    if sample.iter().all(|v| v.as_f64().is_some()) {
        let (min, max) = values
            .iter()
            .filter_map(Value::as_f64)
            .filter(|x| !x.is_nan())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), x| {
                (lo.min(x), hi.max(x))
            });
        let range = (min <= max).then_some([min, max]);
        return ValueTypeDesc::Real {
            range,
            missing: None,
        };
    }
    let distinct: BTreeSet<String> =
        values.iter().filter_map(Value::category_name).collect();
    if distinct.len() + 2 < values.len() {
        return ValueTypeDesc::Categorical {
            categories: distinct.into_iter().map(Category::Name).collect(),
        };
    }
    ValueTypeDesc::String
}
