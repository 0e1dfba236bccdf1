//! Local write operations captured by the write interceptor.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ProtocolError, ProtocolResult};

/// A local mutation, tagged with exactly the data each shape needs.
///
/// Modeling the three operations as variants (rather than a string enum
/// plus a loose payload) lets queue entries be mapped back to wire changes
/// without duck typing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum WriteOperation {
    /// Insert a full row. The id travels inside the row.
    Insert {
        /// The complete row, including `id` and `userId`.
        row: Map<String, Value>,
    },
    /// Overwrite a subset of an existing row's fields.
    Update {
        /// Target record id.
        id: String,
        /// The fields to overwrite.
        fields: Map<String, Value>,
    },
    /// Soft-delete a record.
    Delete {
        /// Target record id.
        id: String,
    },
}

impl WriteOperation {
    /// Resolves the record id this operation targets.
    ///
    /// Fails fast on an insert whose row carries no usable id.
    pub fn record_id(&self) -> ProtocolResult<&str> {
        match self {
            WriteOperation::Insert { row } => row
                .get("id")
                .and_then(Value::as_str)
                .ok_or(ProtocolError::MissingField { field: "id" }),
            WriteOperation::Update { id, .. } | WriteOperation::Delete { id } => Ok(id),
        }
    }

    /// Reconstructs the wire payload for this operation.
    ///
    /// Returns the change `data` plus the tombstone timestamp.
    /// `created_at_ms` is the commit time recorded on the queue entry:
    /// inserts carry it as `createdAt`, deletes as `deletedAt`.
    pub fn change_data(&self, created_at_ms: i64) -> (Map<String, Value>, Option<i64>) {
        match self {
            WriteOperation::Insert { row } => {
                let mut data = row.clone();
                data.entry("createdAt".to_string())
                    .or_insert_with(|| Value::from(created_at_ms));
                (data, None)
            }
            WriteOperation::Update { fields, .. } => (fields.clone(), None),
            WriteOperation::Delete { .. } => (Map::new(), Some(created_at_ms)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn record_id_per_variant() {
        let insert = WriteOperation::Insert {
            row: map(json!({"id": "w1", "userId": "u1", "title": "Legs"})),
        };
        assert_eq!(insert.record_id().unwrap(), "w1");

        let update = WriteOperation::Update {
            id: "w2".into(),
            fields: map(json!({"title": "Pull"})),
        };
        assert_eq!(update.record_id().unwrap(), "w2");

        let delete = WriteOperation::Delete { id: "w3".into() };
        assert_eq!(delete.record_id().unwrap(), "w3");
    }

    #[test]
    fn insert_without_id_fails_fast() {
        let insert = WriteOperation::Insert {
            row: map(json!({"title": "no id here"})),
        };
        assert_eq!(
            insert.record_id(),
            Err(ProtocolError::MissingField { field: "id" })
        );
    }

    #[test]
    fn insert_data_carries_commit_time() {
        let insert = WriteOperation::Insert {
            row: map(json!({"id": "w1", "userId": "u1", "title": "Legs"})),
        };
        let (data, deleted_at) = insert.change_data(7000);
        assert_eq!(data["createdAt"], 7000);
        assert_eq!(data["title"], "Legs");
        assert_eq!(deleted_at, None);
    }

    #[test]
    fn insert_preserves_explicit_created_at() {
        let insert = WriteOperation::Insert {
            row: map(json!({"id": "w1", "userId": "u1", "createdAt": 1234})),
        };
        let (data, _) = insert.change_data(7000);
        assert_eq!(data["createdAt"], 1234);
    }

    #[test]
    fn update_data_is_partial() {
        let update = WriteOperation::Update {
            id: "w1".into(),
            fields: map(json!({"title": "Renamed"})),
        };
        let (data, deleted_at) = update.change_data(7000);
        assert_eq!(data.len(), 1);
        assert_eq!(data["title"], "Renamed");
        assert_eq!(deleted_at, None);
    }

    #[test]
    fn delete_data_is_tombstone_only() {
        let delete = WriteOperation::Delete { id: "w1".into() };
        let (data, deleted_at) = delete.change_data(7000);
        assert!(data.is_empty());
        assert_eq!(deleted_at, Some(7000));
    }

    #[test]
    fn tagged_serde_roundtrip() {
        let update = WriteOperation::Update {
            id: "w1".into(),
            fields: map(json!({"reps": 8})),
        };
        let wire = serde_json::to_value(&update).unwrap();
        assert_eq!(wire["op"], "update");

        let back: WriteOperation = serde_json::from_value(wire).unwrap();
        assert_eq!(back, update);
    }
}
