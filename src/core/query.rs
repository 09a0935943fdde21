//! Query parameters handed to action processes

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single filter condition: `{column, op, value}`
///
/// The `in` operator expects `value` to be an array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryWhere {
    /// Column the condition applies to
    pub column: String,

    /// Comparison operator (`=`, `in`, `like`, ...)
    pub op: String,

    /// Operand
    pub value: Value,
}

impl QueryWhere {
    /// Build `column IN (values...)`
    pub fn is_in(column: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            column: column.into(),
            op: "in".to_string(),
            value: Value::Array(values.into_iter().map(Value::String).collect()),
        }
    }
}

/// Structured query passed in place of a raw argument
///
/// # Example
/// ```rust,ignore
/// // "1,2,3" on a table whose primary key is "id"
/// let param = QueryParam::primary_in("id", "1,2,3");
/// assert_eq!(param.wheres[0].op, "in");
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QueryParam {
    #[serde(default)]
    pub wheres: Vec<QueryWhere>,
}

impl QueryParam {
    /// Rewrite a comma-separated identifier list into a single
    /// `primary IN (...)` condition.
    ///
    /// Identifiers stay strings in their original order; nothing is trimmed
    /// or deduplicated.
    pub fn primary_in(primary: &str, ids: &str) -> Self {
        let ids = ids.split(',').map(str::to_string).collect();
        Self {
            wheres: vec![QueryWhere::is_in(primary, ids)],
        }
    }
}
