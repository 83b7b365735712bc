//! The vector contract and the engine shared by every vector variant.

use std::cmp::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use tracing::trace;

use super::stratification::Stratification;
use super::view::VectorView;
use crate::error::{UnsupportedPersistedSnafu, ViewResult};
use crate::math::{
    categorical_hist, categorical_partitioning, compute_stats, default_bins, numeric_hist,
    Histogram, PartitionOptions, Statistics,
};
use crate::meta::{DatasetDesc, IdType, Value, ValueTypeDesc};
use crate::persist::Persisted;
use crate::range::{self, as_ungrouped, composite, CompositeRange1D, Range, DEFAULT_COLOR};

/// Minimal contract of a one-dimensional dataset.
///
/// Ranges passed in are relative to this vector's logical positions.
#[async_trait]
pub trait VectorData: Send + Sync {
    /// Description of the underlying root dataset.
    fn desc(&self) -> &DatasetDesc;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn value_type(&self) -> &ValueTypeDesc {
        &self.desc().value
    }

    fn idtype(&self) -> Arc<IdType>;

    async fn names(&self, range: &Range) -> ViewResult<Vec<String>>;

    async fn ids(&self, range: &Range) -> ViewResult<Range>;

    async fn data(&self, range: &Range) -> ViewResult<Vec<Value>>;

    async fn at(&self, index: usize) -> ViewResult<Value>;

    /// Lazy view of `range`, composed with any range this vector carries.
    fn view(&self, range: &Range) -> ViewResult<VectorView>;

    fn persist(&self) -> Persisted;

    /// Summary statistics; `None` for non-numeric value types.
    async fn stats(&self) -> ViewResult<Option<Statistics>> {
        if !self.value_type().is_numeric() {
            return Ok(None);
        }
        let data = self.data(&Range::all()).await?;
        Ok(Some(compute_stats(data.iter().map(Value::to_f64_or_nan))))
    }

    /// Histogram over the entries selected by `range`; `None` for
    /// free-form value types. Bins default to `round(sqrt(len))` of the
    /// whole vector, whatever `range` selects.
    async fn hist(&self, bins: Option<usize>, range: &Range) -> ViewResult<Option<Histogram>> {
        let value_type = self.value_type();
        if !value_type.is_numeric() && !value_type.is_categorical() {
            return Ok(None);
        }
        let data = self.data(range).await?;
        let positions: Vec<usize> = (0..data.len()).collect();
        if value_type.is_categorical() {
            return Ok(Some(categorical_hist(
                &data,
                &positions,
                value_type.categories(),
            )));
        }
        let values: Vec<f64> = data.iter().map(Value::to_f64_or_nan).collect();
        let bins = bins.unwrap_or_else(|| default_bins(self.len()));
        Ok(Some(numeric_hist(
            &values,
            &positions,
            bins,
            value_type.numeric_range(),
        )))
    }

    /// Partition of the positions by category, or one ungrouped group.
    async fn groups(&self) -> ViewResult<CompositeRange1D> {
        let name = self.desc().id.clone();
        let categories = self.value_type().categories();
        if !self.value_type().is_categorical() {
            return Ok(composite(name, [as_ungrouped(0..self.len())]));
        }
        let data = self.data(&Range::all()).await?;
        let options = PartitionOptions {
            name,
            labels: Some(
                categories
                    .iter()
                    .map(|c| c.label().unwrap_or(c.name()).to_string())
                    .collect(),
            ),
            colors: Some(
                categories
                    .iter()
                    .map(|c| c.color().unwrap_or(DEFAULT_COLOR).to_string())
                    .collect(),
            ),
            skip_empty: true,
        };
        let names: Vec<String> = categories.iter().map(|c| c.name().to_string()).collect();
        Ok(categorical_partitioning(&data, &names, &options))
    }

    async fn as_stratification(&self) -> ViewResult<Stratification> {
        let groups = self.groups().await?;
        Ok(Stratification::new(self.view(&Range::all())?, groups))
    }

    /// View of the entries whose identifiers are selected by `ids`.
    /// Identifiers this vector does not contain are skipped.
    async fn id_view(&self, ids: &Range) -> ViewResult<VectorView> {
        let mine = self.ids(&Range::all()).await?;
        let positions = mine.index_of(ids, &[self.len()])?;
        trace!(dataset = %self.desc().id, ids = %ids, positions = %positions, "id view");
        self.view(&positions)
    }

    /// Rebuild a view from `{"range": "..."}`; without a range the result
    /// is equivalent to this vector.
    async fn restore(&self, persisted: &JsonValue) -> ViewResult<VectorView> {
        match persisted.get("range") {
            None | Some(JsonValue::Null) => self.view(&Range::all()),
            Some(JsonValue::String(text)) => self.view(&range::parse(text.as_str())?),
            Some(other) => UnsupportedPersistedSnafu {
                what: "vector view",
                persisted: other.to_string(),
            }
            .fail(),
        }
    }
}

/// Traversal over the fetched data of any vector, in logical order.
#[async_trait]
pub trait VectorExt: VectorData {
    async fn every<F>(&self, mut pred: F) -> ViewResult<bool>
    where
        F: FnMut(&Value, usize) -> bool + Send,
    {
        let data = self.data(&Range::all()).await?;
        Ok(data.iter().enumerate().all(|(i, v)| pred(v, i)))
    }

    async fn some<F>(&self, mut pred: F) -> ViewResult<bool>
    where
        F: FnMut(&Value, usize) -> bool + Send,
    {
        let data = self.data(&Range::all()).await?;
        Ok(data.iter().enumerate().any(|(i, v)| pred(v, i)))
    }

    async fn for_each<F>(&self, mut f: F) -> ViewResult<()>
    where
        F: FnMut(&Value, usize) + Send,
    {
        let data = self.data(&Range::all()).await?;
        data.iter().enumerate().for_each(|(i, v)| f(v, i));
        Ok(())
    }

    async fn reduce<A, F>(&self, mut f: F, init: A) -> ViewResult<A>
    where
        A: Send,
        F: FnMut(A, &Value, usize) -> A + Send,
    {
        let data = self.data(&Range::all()).await?;
        Ok(data.iter().enumerate().fold(init, |acc, (i, v)| f(acc, v, i)))
    }

    async fn reduce_right<A, F>(&self, mut f: F, init: A) -> ViewResult<A>
    where
        A: Send,
        F: FnMut(A, &Value, usize) -> A + Send,
    {
        let data = self.data(&Range::all()).await?;
        Ok(data
            .iter()
            .enumerate()
            .rev()
            .fold(init, |acc, (i, v)| f(acc, v, i)))
    }

    /// View in natural value order; the data is not touched.
    async fn sort(&self) -> ViewResult<VectorView> {
        self.sort_by(Value::natural_cmp).await
    }

    /// Stable sort by `cmp`, expressed as a permutation view.
    async fn sort_by<F>(&self, mut cmp: F) -> ViewResult<VectorView>
    where
        F: FnMut(&Value, &Value) -> Ordering + Send,
    {
        let data = self.data(&Range::all()).await?;
        let mut order: Vec<usize> = (0..data.len()).collect();
        order.sort_by(|&a, &b| cmp(&data[a], &data[b]));
        self.view(&Range::list(order))
    }

    /// View of the entries accepted by `pred`, in order.
    async fn filter<F>(&self, mut pred: F) -> ViewResult<VectorView>
    where
        F: FnMut(&Value, usize) -> bool + Send,
    {
        let data = self.data(&Range::all()).await?;
        let keep: Vec<usize> = data
            .iter()
            .enumerate()
            .filter(|(i, v)| pred(*v, *i))
            .map(|(i, _)| i)
            .collect();
        self.view(&Range::list(keep))
    }
}

impl<T: VectorData + ?Sized> VectorExt for T {}
