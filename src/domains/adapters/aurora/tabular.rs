//! Reshaping of Data API statement output into a table.

use std::collections::{BTreeMap, HashSet};

use schemars::JsonSchema;
use serde::Serialize;

use super::{FieldValue, StatementOutput};
use crate::domains::adapters::failure::{BackendFailure, FailureClass};
use crate::domains::tools::Value;

/// Column name used when the backend reports neither label nor name.
pub const ANONYMOUS_COLUMN: &str = "?column?";

/// Result of a single SQL statement.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TabularResult {
    /// Column names in result order.
    pub columns: Vec<String>,
    /// One map per row, keyed by column name.
    #[schemars(with = "Vec<BTreeMap<String, serde_json::Value>>")]
    pub rows: Vec<BTreeMap<String, Value>>,
    /// Rows returned, or rows affected for statements without a result set.
    pub row_count: i64,
    /// Values generated by the statement (e.g. serial keys), when any.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<Vec<serde_json::Value>>")]
    pub generated_fields: Option<Vec<Value>>,
}

impl From<FieldValue> for Value {
    fn from(field: FieldValue) -> Self {
        match field {
            FieldValue::Null => Value::Null,
            FieldValue::Boolean(b) => Value::Bool(b),
            FieldValue::Long(i) => Value::Integer(i),
            FieldValue::Double(f) => Value::Float(f),
            FieldValue::String(s) => Value::String(s),
            FieldValue::Blob(bytes) => Value::Binary(bytes),
            FieldValue::Array(items) => Value::List(items.into_iter().map(Value::from).collect()),
        }
    }
}

/// Build the table for one statement output.
///
/// Every record must carry exactly one field per column; anything else is
/// reported as a malformed result rather than truncated.
pub fn reshape(output: StatementOutput) -> Result<TabularResult, BackendFailure> {
    let columns = column_names(&output);

    let (rows, row_count) = match output.records {
        Some(records) => {
            let count = records.len() as i64;
            let rows = records
                .into_iter()
                .enumerate()
                .map(|(index, record)| {
                    if record.len() != columns.len() {
                        return Err(BackendFailure::new(
                            FailureClass::Other,
                            "MalformedResult",
                            format!(
                                "record {index} has {} fields for {} columns",
                                record.len(),
                                columns.len()
                            ),
                        ));
                    }
                    Ok(columns
                        .iter()
                        .cloned()
                        .zip(record.into_iter().map(Value::from))
                        .collect::<BTreeMap<_, _>>())
                })
                .collect::<Result<Vec<_>, _>>()?;
            (rows, count)
        }
        None => (Vec::new(), output.records_updated),
    };

    let generated_fields = (!output.generated_fields.is_empty())
        .then(|| output.generated_fields.into_iter().map(Value::from).collect());

    Ok(TabularResult {
        columns,
        rows,
        row_count,
        generated_fields,
    })
}

/// Label, then name, then `?column?`. A name already taken gets the first
/// free `_2`, `_3`, ... suffix, so every column keeps its own key.
fn column_names(output: &StatementOutput) -> Vec<String> {
    let mut used: HashSet<String> = HashSet::new();
    output
        .columns
        .iter()
        .map(|column| {
            let base = column
                .label
                .as_deref()
                .filter(|label| !label.is_empty())
                .or(column.name.as_deref().filter(|name| !name.is_empty()))
                .unwrap_or(ANONYMOUS_COLUMN);
            let mut candidate = base.to_string();
            let mut suffix = 2;
            while used.contains(&candidate) {
                candidate = format!("{base}_{suffix}");
                suffix += 1;
            }
            used.insert(candidate.clone());
            candidate
        })
        .collect()
}
