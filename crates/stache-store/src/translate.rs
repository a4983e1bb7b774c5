//! Document-store JSON filter dialect.
//!
//! [`JsonFilterTranslator`] emits the Mongo-style dialect used by document
//! databases:
//!
//! ```json
//! {"$or": [{"$and": [{"kind": {"$eq": "guide"}}, {"year": {"$gte": 2020}}]},
//!          {"pinned": {"$exists": true}}]}
//! ```
//!
//! [`parse_json_filter`] reads the dialect back so a backend that stores
//! queries in this form can evaluate them.

use serde_json::{Map, Value, json};
use stache_core::{
    Comparison, FilterExpression, FilterOperator, FilterTranslator, Metadata, MetadataValue,
    StoreError,
};
use std::collections::BTreeSet;

/// Translator for the JSON dialect, limited to a set of operators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonFilterTranslator {
    operators: BTreeSet<FilterOperator>,
}

impl JsonFilterTranslator {
    pub fn new(operators: impl IntoIterator<Item = FilterOperator>) -> Self {
        Self {
            operators: operators.into_iter().collect(),
        }
    }

    /// A translator that can emit every operator.
    #[must_use]
    pub fn all() -> Self {
        Self::new(FilterOperator::ALL)
    }
}

impl Default for JsonFilterTranslator {
    fn default() -> Self {
        Self::all()
    }
}

impl FilterTranslator for JsonFilterTranslator {
    type Fragment = Value;

    fn supports(&self, op: FilterOperator) -> bool {
        self.operators.contains(&op)
    }

    fn leaf(&self, field: &str, comparison: &Comparison) -> Value {
        let condition = match comparison {
            Comparison::Eq(v) => json!({ "$eq": v }),
            Comparison::Ne(v) => json!({ "$ne": v }),
            Comparison::In(values) => json!({ "$in": values }),
            Comparison::Gt(v) => json!({ "$gt": v }),
            Comparison::Gte(v) => json!({ "$gte": v }),
            Comparison::Lt(v) => json!({ "$lt": v }),
            Comparison::Lte(v) => json!({ "$lte": v }),
            Comparison::Exists => json!({ "$exists": true }),
        };
        let mut leaf = Map::new();
        leaf.insert(field.to_string(), condition);
        Value::Object(leaf)
    }

    fn and(&self, children: Vec<Value>) -> Value {
        json!({ "$and": children })
    }

    fn or(&self, children: Vec<Value>) -> Value {
        json!({ "$or": children })
    }

    fn not(&self, child: Value) -> Value {
        json!({ "$not": child })
    }
}

/// Parse a JSON dialect query back into a filter tree.
pub fn parse_json_filter(query: &Value) -> Result<FilterExpression, StoreError> {
    let object = query
        .as_object()
        .ok_or_else(|| invalid(format!("expected an object, got {query}")))?;
    let (key, body) = single_entry(object)?;

    match key.as_str() {
        "$and" => Ok(FilterExpression::And(parse_children(body)?)),
        "$or" => Ok(FilterExpression::Or(parse_children(body)?)),
        "$not" => Ok(parse_json_filter(body)?.negate()),
        field => {
            let condition = body
                .as_object()
                .ok_or_else(|| invalid(format!("condition on '{field}' must be an object")))?;
            let (op, operand) = single_entry(condition)?;
            let comparison = match op.as_str() {
                "$eq" => Comparison::Eq(metadata_value(operand)?),
                "$ne" => Comparison::Ne(metadata_value(operand)?),
                "$in" => {
                    let values = operand
                        .as_array()
                        .ok_or_else(|| invalid("$in expects an array".to_string()))?;
                    Comparison::In(values.iter().map(metadata_value).collect::<Result<_, _>>()?)
                }
                "$gt" => Comparison::Gt(metadata_value(operand)?),
                "$gte" => Comparison::Gte(metadata_value(operand)?),
                "$lt" => Comparison::Lt(metadata_value(operand)?),
                "$lte" => Comparison::Lte(metadata_value(operand)?),
                "$exists" => Comparison::Exists,
                other => return Err(invalid(format!("unknown operator '{other}'"))),
            };
            Ok(FilterExpression::condition(field, comparison))
        }
    }
}

/// Evaluate a JSON dialect query against record metadata.
pub fn evaluate_json_filter(query: &Value, metadata: &Metadata) -> Result<bool, StoreError> {
    Ok(parse_json_filter(query)?.matches(metadata))
}

fn single_entry(object: &Map<String, Value>) -> Result<(&String, &Value), StoreError> {
    let mut entries = object.iter();
    match (entries.next(), entries.next()) {
        (Some(entry), None) => Ok(entry),
        _ => Err(invalid(format!(
            "expected exactly one key, got {}",
            object.len()
        ))),
    }
}

fn parse_children(body: &Value) -> Result<Vec<FilterExpression>, StoreError> {
    body.as_array()
        .ok_or_else(|| invalid("combinator expects an array".to_string()))?
        .iter()
        .map(parse_json_filter)
        .collect()
}

fn metadata_value(value: &Value) -> Result<MetadataValue, StoreError> {
    serde_json::from_value(value.clone())
        .map_err(|e| invalid(format!("unsupported operand {value}: {e}")))
}

fn invalid(message: String) -> StoreError {
    StoreError::InvalidFilter(message)
}
