//! Stored-row model shared by the client and server stores.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Map, Value};

use crate::change::ChangeItem;
use crate::error::{ProtocolError, ProtocolResult};
use crate::registry::TIMESTAMP_FIELDS;

/// Converts an epoch-millisecond wire timestamp to the native temporal type.
pub fn datetime_from_ms(ms: i64) -> ProtocolResult<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .ok_or(ProtocolError::TimestampOutOfRange(ms))
}

/// Converts a native timestamp back to epoch milliseconds.
pub fn ms_from_datetime(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

/// A stored row in a syncable table.
///
/// Every syncable table carries the same replication columns (`id`,
/// `userId`, `updatedAt`, `deletedAt`); everything else lives in `fields`
/// as it appeared on the wire. A record with `deleted_at` set is a
/// tombstone — rows are never physically removed.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Stable record id.
    pub id: String,
    /// Owning user.
    pub user_id: String,
    /// Creation time, when known.
    pub created_at: Option<DateTime<Utc>>,
    /// Authoritative conflict timestamp.
    pub updated_at: DateTime<Utc>,
    /// Tombstone timestamp.
    pub deleted_at: Option<DateTime<Utc>>,
    /// Remaining columns.
    pub fields: Map<String, Value>,
}

impl Record {
    /// Builds a record from a wire change, converting numeric epoch fields
    /// to the native temporal type.
    ///
    /// The replication columns are lifted out of `data`; any remaining
    /// timestamp-named field must be numeric (or null) to be accepted.
    pub fn from_change(change: &ChangeItem) -> ProtocolResult<Self> {
        let mut fields = change.data.clone();
        fields.remove("id");

        let user_id = match fields.remove("userId") {
            Some(Value::String(user)) => user,
            Some(_) => return Err(ProtocolError::InvalidField { field: "userId" }),
            None => return Err(ProtocolError::MissingField { field: "userId" }),
        };

        let created_at = match take_ms(&mut fields, "createdAt")? {
            Some(ms) => Some(datetime_from_ms(ms)?),
            None => None,
        };

        // The top-level updatedAt is authoritative; a copy inside the row is
        // dropped rather than trusted.
        fields.remove("updatedAt");

        let deleted_ms = match change.deleted_at {
            Some(ms) => Some(ms),
            None => take_ms(&mut fields, "deletedAt")?,
        };
        fields.remove("deletedAt");
        let deleted_at = match deleted_ms {
            Some(ms) => Some(datetime_from_ms(ms)?),
            None => None,
        };

        for field in TIMESTAMP_FIELDS {
            if let Some(value) = fields.get(*field) {
                if !value.is_null() && value.as_i64().is_none() {
                    return Err(ProtocolError::InvalidField { field });
                }
            }
        }

        Ok(Self {
            id: change.id.clone(),
            user_id,
            created_at,
            updated_at: datetime_from_ms(change.updated_at)?,
            deleted_at,
            fields,
        })
    }

    /// Serializes back to the wire shape, tagging the item with its table.
    pub fn to_change(&self, table: &str) -> ChangeItem {
        let mut data = self.fields.clone();
        data.insert("userId".to_string(), Value::String(self.user_id.clone()));
        if let Some(created) = self.created_at {
            data.insert(
                "createdAt".to_string(),
                Value::from(ms_from_datetime(created)),
            );
        }

        ChangeItem {
            table: table.to_string(),
            id: self.id.clone(),
            data,
            updated_at: ms_from_datetime(self.updated_at),
            deleted_at: self.deleted_at.map(ms_from_datetime),
        }
    }

    /// Conflict timestamp in epoch milliseconds.
    pub fn updated_at_ms(&self) -> i64 {
        ms_from_datetime(self.updated_at)
    }

    /// Returns true if this record is soft-deleted.
    pub fn is_tombstoned(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Removes a numeric epoch field, treating null as absent.
fn take_ms(fields: &mut Map<String, Value>, field: &'static str) -> ProtocolResult<Option<i64>> {
    match fields.remove(field) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_i64()
            .map(Some)
            .ok_or(ProtocolError::InvalidField { field }),
    }
}
