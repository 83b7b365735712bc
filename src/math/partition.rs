use crate::meta::Value;
use crate::range::{CompositeRange1D, Range1DGroup, DEFAULT_COLOR};

/// Naming and display options for [`categorical_partitioning`].
#[derive(Debug, Clone, Default)]
pub struct PartitionOptions {
    /// Name of the resulting composite range.
    pub name: String,
    /// Group labels, parallel to the categories; defaults to the category.
    pub labels: Option<Vec<String>>,
    /// Group colors, parallel to the categories; the last color repeats.
    pub colors: Option<Vec<String>>,
    /// Drop categories that match no value.
    pub skip_empty: bool,
}

/// Partition positions of `values` by category, in category order.
///
/// Values that match no category are left out of every group.
pub fn categorical_partitioning(
    values: &[Value],
    categories: &[String],
    options: &PartitionOptions,
) -> CompositeRange1D {
    let mut members: Vec<Vec<usize>> = vec![Vec::new(); categories.len()];
    for (pos, value) in values.iter().enumerate() {
        let Some(name) = value.category_name() else {
            continue;
        };
        if let Some(bin) = categories.iter().position(|c| *c == name) {
            members[bin].push(pos);
        }
    }
    let groups = categories
        .iter()
        .zip(members)
        .enumerate()
        .filter(|(_, (_, indices))| !(options.skip_empty && indices.is_empty()))
        .map(|(i, (category, indices))| {
            let label = options
                .labels
                .as_ref()
                .and_then(|l| l.get(i))
                .unwrap_or(category);
            let color = options
                .colors
                .as_ref()
                .and_then(|c| c.get(i).or_else(|| c.last()))
                .map(String::as_str)
                .unwrap_or(DEFAULT_COLOR);
            Range1DGroup::new(label.clone(), color, indices)
        });
    CompositeRange1D::new(options.name.clone(), groups)
}
