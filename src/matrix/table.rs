//! Ad-hoc matrices over in-memory tables.

use std::sync::Arc;

use snafu::prelude::*;
use tracing::debug;

use super::root::Matrix;
use crate::backend::{IdAssigner, LocalIdAssigner, MatrixPayload, MemoryLoader};
use crate::config::InferenceConfig;
use crate::error::{InvalidTableSnafu, ViewResult};
use crate::meta::{guess_value_type, DatasetDesc, Value, ValueTypeDesc};

/// Options for [`Matrix::from_table`].
///
/// Without explicit `rows` the first column holds the row labels; without
/// explicit `cols` the first row holds the column labels.
#[derive(Clone, Default)]
pub struct TableOptions {
    pub rows: Option<Vec<String>>,
    pub cols: Option<Vec<String>>,
    pub name: Option<String>,
    pub rowtype: Option<String>,
    pub coltype: Option<String>,
    pub row_assigner: Option<Arc<dyn IdAssigner>>,
    /// Falls back to `row_assigner`, then to a fresh local assigner.
    pub col_assigner: Option<Arc<dyn IdAssigner>>,
    pub inference: InferenceConfig,
}

impl Matrix {
    /// Root matrix over `table`, with a generated description and an
    /// inferred value type.
    pub fn from_table(table: Vec<Vec<Value>>, options: TableOptions) -> ViewResult<Matrix> {
        let TableOptions {
            rows,
            cols,
            name,
            rowtype,
            coltype,
            row_assigner,
            col_assigner,
            inference,
        } = options;

        let mut table = table;
        let cols = match cols {
            Some(cols) => cols,
            None => {
                ensure!(
                    !table.is_empty(),
                    InvalidTableSnafu {
                        msg: "missing header row",
                    }
                );
                let header = table.remove(0);
                header.iter().skip(1).map(Value::to_string).collect()
            }
        };
        let (rows, cells): (Vec<String>, Vec<Vec<Value>>) = match rows {
            Some(rows) => (rows, table),
            None => table
                .into_iter()
                .map(|mut row| {
                    let label = if row.is_empty() {
                        String::new()
                    } else {
                        row.remove(0).to_string()
                    };
                    (label, row)
                })
                .unzip(),
        };

        let flat: Vec<Value> = cells.iter().flatten().cloned().collect();
        let value = guess_value_type(&flat, inference.sample_size);
        let cells = if value.is_numeric() {
            cells
                .into_iter()
                .map(|row| {
                    row.into_iter()
                        .map(|v| v.as_f64().map(Value::Real).unwrap_or(Value::Missing))
                        .collect()
                })
                .collect()
        } else {
            cells
        };

        let mut desc = DatasetDesc::default_matrix();
        desc.size = smallvec::smallvec![rows.len(), cols.len()];
        desc.value = value;
        if let Some(name) = name {
            desc.fqname = name.clone();
            desc.name = name;
        }
        if let Some(rowtype) = rowtype {
            desc.idtype = rowtype;
        }
        if coltype.is_some() {
            desc.coltype = coltype;
        }

        let col_assigner: Arc<dyn IdAssigner> = col_assigner
            .or_else(|| row_assigner.clone())
            .unwrap_or_else(|| LocalIdAssigner::new() as Arc<dyn IdAssigner>);
        let row_assigner: Arc<dyn IdAssigner> = row_assigner
            .unwrap_or_else(|| LocalIdAssigner::new() as Arc<dyn IdAssigner>);
        let row_ids = row_assigner.assign(&rows);
        let col_ids = col_assigner.assign(&cols);

        debug!(
            dataset = %desc.id,
            rows = rows.len(),
            cols = cols.len(),
            value = describe(&desc.value),
            "matrix from table"
        );
        let payload = MatrixPayload::new(rows, row_ids, cols, col_ids, cells)?;
        Ok(Matrix::create(desc, Arc::new(MemoryLoader::new(payload))))
    }
}

fn describe(value: &ValueTypeDesc) -> &'static str {
    match value {
        ValueTypeDesc::Categorical { .. } => "categorical",
        ValueTypeDesc::Real { .. } => "real",
        ValueTypeDesc::Int { .. } => "int",
        ValueTypeDesc::String => "string",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::MatrixData;
    use crate::range::{list, Range};
    use crate::ViewError;

    fn scenario() -> Vec<Vec<Value>> {
        let mut table = vec![vec![
            Value::from("_"),
            Value::from("c1"),
            Value::from("c2"),
            Value::from("c3"),
        ]];
        for (i, label) in ["r1", "r2", "r3"].into_iter().enumerate() {
            let mut row = vec![Value::from(label)];
            row.extend((1..=3).map(|j| Value::Int((i * 3 + j) as i64)));
            table.push(row);
        }
        table
    }

    #[tokio::test]
    async fn three_by_three_table() {
        let m = Matrix::from_table(scenario(), TableOptions::default()).unwrap();
        assert_eq!(m.shape().as_slice(), &[3, 3]);
        assert!(m.value_type().is_numeric());
        assert_eq!(m.at(1, 2).await.unwrap(), Value::Real(6.0));
        assert_eq!(m.t().at(2, 1).await.unwrap(), Value::Real(6.0));
        assert_eq!(m.rows(&Range::all()).await.unwrap(), vec!["r1", "r2", "r3"]);
        assert_eq!(m.cols(&Range::all()).await.unwrap(), vec!["c1", "c2", "c3"]);
        assert_eq!(m.desc().name, "Matrix");
    }

    #[tokio::test]
    async fn explicit_labels_keep_every_cell() {
        let table = vec![
            vec![Value::from("x"), Value::from("y")],
            vec![Value::from("y"), Value::from("x")],
            vec![Value::from("x"), Value::from("x")],
        ];
        let m = Matrix::from_table(
            table,
            TableOptions {
                rows: Some(vec!["a".into(), "b".into(), "c".into()]),
                cols: Some(vec!["p".into(), "q".into()]),
                name: Some("letters".into()),
                rowtype: Some("gene".into()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(m.shape().as_slice(), &[3, 2]);
        assert_eq!(m.desc().name, "letters");
        assert_eq!(m.rowtype().id(), "gene");
        assert_eq!(m.coltype().id(), crate::meta::DEFAULT_COLTYPE);
        assert!(m.value_type().is_categorical());
        assert_eq!(m.at(1, 0).await.unwrap(), Value::from("y"));
    }

    #[tokio::test]
    async fn column_assigner_defaults_to_row_assigner() {
        let shared = LocalIdAssigner::new();
        let m = Matrix::from_table(
            scenario(),
            TableOptions {
                row_assigner: Some(shared.clone()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(m.row_ids(&Range::all()).await.unwrap(), list([0, 1, 2]));
        assert_eq!(m.col_ids(&Range::all()).await.unwrap(), list([3, 4, 5]));

        let separate = Matrix::from_table(
            scenario(),
            TableOptions {
                row_assigner: Some(LocalIdAssigner::new()),
                col_assigner: Some(LocalIdAssigner::new()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(separate.col_ids(&Range::all()).await.unwrap(), list([0, 1, 2]));
    }

    #[test]
    fn rejects_empty_and_ragged_tables() {
        let err = Matrix::from_table(Vec::new(), TableOptions::default()).unwrap_err();
        assert!(matches!(err, ViewError::InvalidTable { .. }));
        let mut ragged = scenario();
        ragged[2].pop();
        assert!(Matrix::from_table(ragged, TableOptions::default()).is_err());
    }
}
