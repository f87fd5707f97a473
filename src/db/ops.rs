use serde::Serialize;
use serde_json::{Map, Value};

use super::{Collection, Query};
use crate::error::Result;

/// Field transform applied to a stored document.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldOp {
    Set(String, Value),
    /// Adds `delta`; a missing or non-integer field counts as zero.
    Increment(String, i64),
    /// Appends each value not already present.
    ArrayUnion(String, Vec<Value>),
    /// Removes every occurrence of each value.
    ArrayRemove(String, Vec<Value>),
}

impl FieldOp {
    pub fn set(field: &str, value: impl Into<Value>) -> Self {
        FieldOp::Set(field.to_string(), value.into())
    }

    pub fn increment(field: &str, delta: i64) -> Self {
        FieldOp::Increment(field.to_string(), delta)
    }

    pub fn array_union(field: &str, value: impl Into<Value>) -> Self {
        FieldOp::ArrayUnion(field.to_string(), vec![value.into()])
    }

    pub fn array_remove(field: &str, value: impl Into<Value>) -> Self {
        FieldOp::ArrayRemove(field.to_string(), vec![value.into()])
    }

    pub fn apply(&self, doc: &mut Map<String, Value>) {
        match self {
            FieldOp::Set(field, value) => {
                doc.insert(field.clone(), value.clone());
            }
            FieldOp::Increment(field, delta) => {
                let current = doc.get(field).and_then(Value::as_i64).unwrap_or(0);
                doc.insert(field.clone(), Value::from(current + delta));
            }
            FieldOp::ArrayUnion(field, values) => {
                let mut array = take_array(doc, field);
                for value in values {
                    if !array.contains(value) {
                        array.push(value.clone());
                    }
                }
                doc.insert(field.clone(), Value::Array(array));
            }
            FieldOp::ArrayRemove(field, values) => {
                let mut array = take_array(doc, field);
                array.retain(|v| !values.contains(v));
                doc.insert(field.clone(), Value::Array(array));
            }
        }
    }
}

/// Removes the array at `field`; a missing or non-array value yields an empty one.
fn take_array(doc: &mut Map<String, Value>, field: &str) -> Vec<Value> {
    match doc.remove(field) {
        Some(Value::Array(array)) => array,
        _ => Vec::new(),
    }
}

/// One write inside an atomic batch.
#[derive(Debug, Clone)]
pub enum Write {
    Insert {
        collection: Collection,
        id: String,
        data: Value,
    },
    Update {
        collection: Collection,
        id: String,
        ops: Vec<FieldOp>,
        /// The batch fails unless this field currently holds this value.
        precondition: Option<(String, Value)>,
        /// Skip the update instead of failing when the document is gone.
        missing_ok: bool,
    },
    Delete {
        collection: Collection,
        id: String,
    },
    /// Deletes every document whose `field` equals `value`.
    DeleteWhere {
        collection: Collection,
        field: String,
        value: Value,
    },
    /// Writes nothing; the batch fails with `Conflict` if any document matches.
    Absent { query: Query, conflict: String },
}

impl Write {
    pub fn insert<T: Serialize>(collection: Collection, id: &str, doc: &T) -> Result<Self> {
        let data = serde_json::to_value(doc).map_err(|source| crate::Error::Corrupt {
            collection,
            id: id.to_string(),
            source,
        })?;
        Ok(Write::Insert {
            collection,
            id: id.to_string(),
            data,
        })
    }

    pub fn update(collection: Collection, id: &str, ops: Vec<FieldOp>) -> Self {
        Write::Update {
            collection,
            id: id.to_string(),
            ops,
            precondition: None,
            missing_ok: false,
        }
    }

    pub fn delete(collection: Collection, id: &str) -> Self {
        Write::Delete {
            collection,
            id: id.to_string(),
        }
    }

    pub fn delete_where(collection: Collection, field: &str, value: impl Into<Value>) -> Self {
        Write::DeleteWhere {
            collection,
            field: field.to_string(),
            value: value.into(),
        }
    }

    /// Fails the batch with `Error::Conflict(conflict)` if `query` matches anything.
    pub fn absent(query: Query, conflict: impl Into<String>) -> Self {
        Write::Absent {
            query,
            conflict: conflict.into(),
        }
    }

    /// Guards an update on the current value of a field.
    pub fn when(mut self, field: &str, expected: impl Into<Value>) -> Self {
        if let Write::Update { precondition, .. } = &mut self {
            *precondition = Some((field.to_string(), expected.into()));
        }
        self
    }

    /// Lets an update of a missing document succeed without writing.
    pub fn if_exists(mut self) -> Self {
        if let Write::Update { missing_ok, .. } = &mut self {
            *missing_ok = true;
        }
        self
    }
}
