//! Histograms over categorical and numeric data windows.

use serde::Serialize;

use crate::meta::{Category, Value};
use crate::range::{CompositeRange1D, DEFAULT_COLOR};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum HistogramKind {
    Categorical,
    Numeric { range: [f64; 2] },
    /// One bin per group of a composite range.
    Range,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistBin {
    pub label: String,
    pub color: Option<String>,
    pub count: usize,
    /// Lower bound (inclusive) for numeric bins.
    pub lower: Option<f64>,
    /// Upper bound for numeric bins; inclusive for the last bin only.
    pub upper: Option<f64>,
    /// Indices of the contributing entries.
    pub indices: Vec<usize>,
}

impl HistBin {
    fn labelled(label: impl Into<String>, color: Option<String>) -> Self {
        Self {
            label: label.into(),
            color,
            count: 0,
            lower: None,
            upper: None,
            indices: Vec::new(),
        }
    }

    fn push(&mut self, index: usize) {
        self.count += 1;
        self.indices.push(index);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub kind: HistogramKind,
    pub bins: Vec<HistBin>,
    /// Entries that fall in no bin.
    pub missing: usize,
    pub missing_indices: Vec<usize>,
}

impl Histogram {
    fn new(kind: HistogramKind, bins: Vec<HistBin>) -> Self {
        Self {
            kind,
            bins,
            missing: 0,
            missing_indices: Vec::new(),
        }
    }

    fn push_missing(&mut self, index: usize) {
        self.missing += 1;
        self.missing_indices.push(index);
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    pub fn counts(&self) -> Vec<usize> {
        self.bins.iter().map(|b| b.count).collect()
    }

    /// Number of binned entries.
    pub fn valid(&self) -> usize {
        self.bins.iter().map(|b| b.count).sum()
    }

    pub fn largest_frequency(&self) -> usize {
        self.bins.iter().map(|b| b.count).max().unwrap_or_default()
    }
}

/// Count `values` per declared category, in declaration order.
///
/// `indices[k]` is recorded for `values[k]`. Labels fall back to the
/// category name, colors to [`DEFAULT_COLOR`].
pub fn categorical_hist(
    values: &[Value],
    indices: &[usize],
    categories: &[Category],
) -> Histogram {
    let bins = categories
        .iter()
        .map(|c| {
            HistBin::labelled(
                c.label().unwrap_or(c.name()),
                Some(c.color().unwrap_or(DEFAULT_COLOR).to_string()),
            )
        })
        .collect();
    let mut hist = Histogram::new(HistogramKind::Categorical, bins);
    for (value, &index) in values.iter().zip(indices) {
        let bin = value
            .category_name()
            .and_then(|name| categories.iter().position(|c| c.name() == name));
        match bin {
            Some(bin) => hist.bins[bin].push(index),
            None => hist.push_missing(index),
        }
    }
    hist
}

/// Equal-width histogram with `bins` buckets over `range`, or over the
/// observed extent when no range is declared. NaN and out-of-range values
/// count as missing.
pub fn numeric_hist(
    values: &[f64],
    indices: &[usize],
    bins: usize,
    range: Option<[f64; 2]>,
) -> Histogram {
    let bins = bins.max(1);
    let [lo, hi] = range.unwrap_or_else(|| observed_range(values));
    let width = (hi - lo) / bins as f64;
    let edges: Vec<HistBin> = (0..bins)
        .map(|i| {
            let lower = lo + width * i as f64;
            let upper = if i + 1 == bins { hi } else { lo + width * (i + 1) as f64 };
            let mut bin = HistBin::labelled(format!("{lower}-{upper}"), None);
            bin.lower = Some(lower);
            bin.upper = Some(upper);
            bin
        })
        .collect();
    let mut hist = Histogram::new(HistogramKind::Numeric { range: [lo, hi] }, edges);
    for (&x, &index) in values.iter().zip(indices) {
        if x.is_nan() || x < lo || x > hi {
            hist.push_missing(index);
            continue;
        }
        let bin = if width > 0.0 {
            (((x - lo) / width) as usize).min(bins - 1)
        } else {
            0
        };
        hist.bins[bin].push(index);
    }
    hist
}

fn observed_range(values: &[f64]) -> [f64; 2] {
    let (lo, hi) = values
        .iter()
        .filter(|x| !x.is_nan())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| {
            (lo.min(x), hi.max(x))
        });
    if lo > hi {
        [0.0, 0.0]
    } else {
        [lo, hi]
    }
}

/// One bin per group of `range`.
pub fn range_hist(range: &CompositeRange1D) -> Histogram {
    let bins = range
        .groups
        .iter()
        .map(|g| {
            let mut bin = HistBin::labelled(g.name.clone(), Some(g.color.clone()));
            bin.count = g.len();
            bin.indices = g.indices().to_vec();
            bin
        })
        .collect();
    Histogram::new(HistogramKind::Range, bins)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::range::{composite, Range1DGroup};

    #[test]
    fn categorical_counts_follow_declared_order() {
        let values: Vec<Value> = ["a", "b", "a", "c"].into_iter().map(Value::from).collect();
        let categories: Vec<Category> = vec!["a".into(), "b".into(), "c".into()];
        let h = categorical_hist(&values, &[0, 1, 2, 3], &categories);
        assert_eq!(h.counts(), vec![2, 1, 1]);
        assert_eq!(h.bins[0].indices, vec![0, 2]);
        assert_eq!(h.bins[2].color.as_deref(), Some(DEFAULT_COLOR));
        assert_eq!(h.missing, 0);
    }

    #[test]
    fn categorical_uses_metadata_and_counts_unknowns_as_missing() {
        let values: Vec<Value> = ["x", "z", "y"].into_iter().map(Value::from).collect();
        let categories = vec![
            Category::Detailed {
                name: "y".into(),
                label: Some("Yes".into()),
                color: Some("green".into()),
            },
            Category::Name("x".into()),
        ];
        let h = categorical_hist(&values, &[0, 1, 2], &categories);
        assert_eq!(h.bins[0].label, "Yes");
        assert_eq!(h.bins[0].color.as_deref(), Some("green"));
        assert_eq!(h.counts(), vec![1, 1]);
        assert_eq!(h.missing_indices, vec![1]);
    }

    #[test]
    fn numeric_bins_are_equal_width() {
        let values = [0.0, 1.0, 2.5, 5.0, 9.9, 10.0, f64::NAN];
        let h = numeric_hist(&values, &[0, 1, 2, 3, 4, 5, 6], 2, Some([0.0, 10.0]));
        assert_eq!(h.counts(), vec![3, 3]);
        assert_eq!(h.missing, 1);
        assert_eq!(h.bins[1].lower, Some(5.0));
        assert_eq!(h.kind, HistogramKind::Numeric { range: [0.0, 10.0] });
    }

    #[test]
    fn numeric_uses_observed_range_without_declaration() {
        let h = numeric_hist(&[3.0, 3.0, 3.0], &[0, 1, 2], 3, None);
        assert_eq!(h.counts(), vec![3, 0, 0]);
        let h = numeric_hist(&[1.0, 2.0, 3.0, 4.0], &[0, 1, 2, 3], 3, None);
        assert_eq!(h.valid(), 4);
        assert_eq!(h.largest_frequency(), 2);
    }

    #[test]
    fn range_hist_has_one_bin_per_group() {
        let c = composite(
            "s",
            [Range1DGroup::new("a", "red", [0, 2]), Range1DGroup::new("b", "blue", [1])],
        );
        let h = range_hist(&c);
        assert_eq!(h.counts(), vec![2, 1]);
        assert_eq!(h.kind, HistogramKind::Range);
        assert_eq!(h.bins[1].label, "b");
    }
}
