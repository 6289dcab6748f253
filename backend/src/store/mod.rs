//! Record store contract
//!
//! The ledger never talks to a concrete database. It needs a document store
//! offering:
//! - get-by-id, create (store-assigned id and timestamps), delete
//! - field-equality queries with optional ordering
//! - single-document updates made of field writes, atomic integer deltas and
//!   server timestamps, optionally guarded by a field-equality precondition
//!
//! # Critical Invariants
//!
//! 1. **No read-modify-write**: counters and balances change only through
//!    [`FieldUpdate::Increment`], never by writing back a previously read value
//! 2. **Single-document atomicity**: all updates in one [`RecordStore::update`]
//!    call apply together or not at all
//! 3. **Delete returns what it removed**: only the caller that actually removed a
//!    document sees `Some`, which lets compensating actions run exactly once

pub mod memory;
pub mod snapshot;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

pub use memory::{InMemoryStore, StoreOp};
pub use snapshot::{DocumentSnapshot, StoreSnapshot};

/// Field map of one stored document
pub type Fields = serde_json::Map<String, Value>;

/// Server-assigned creation timestamp field
pub const CREATED_AT: &str = "createdAt";

/// Server-assigned last-update timestamp field
pub const UPDATED_AT: &str = "updatedAt";

/// Named document collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Properties,
    Tenants,
    Payments,
}

impl Collection {
    pub const ALL: [Collection; 3] = [
        Collection::Properties,
        Collection::Tenants,
        Collection::Payments,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Collection::Properties => "properties",
            Collection::Tenants => "tenants",
            Collection::Payments => "payments",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors surfaced by a [`RecordStore`]
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StoreError {
    #[error("{collection}/{id} not found")]
    NotFound { collection: Collection, id: String },

    #[error("precondition failed on {collection}/{id}: field '{field}' changed")]
    PreconditionFailed {
        collection: Collection,
        id: String,
        field: String,
    },

    #[error("field '{field}' on {collection}/{id} is not an integer")]
    NotNumeric {
        collection: Collection,
        id: String,
        field: String,
    },

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("snapshot digest mismatch: expected {expected}, computed {actual}")]
    SnapshotMismatch { expected: String, actual: String },
}

/// A stored document: its id plus its fields
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

impl Document {
    /// Read a field, treating absence as `null`
    pub fn field(&self, name: &str) -> &Value {
        self.fields.get(name).unwrap_or(&Value::Null)
    }

    /// Read an integer field, treating absence or `null` as zero
    pub fn int_field(&self, name: &str) -> i64 {
        self.field(name).as_i64().unwrap_or(0)
    }
}

/// One write inside a single-document update
#[derive(Debug, Clone, PartialEq)]
pub enum FieldUpdate {
    /// Overwrite a field
    Set { field: String, value: Value },

    /// Add a signed delta to an integer field (missing counts as 0)
    ///
    /// With a floor, the stored result is `max(floor, current + delta)`.
    Increment {
        field: String,
        delta: i64,
        floor: Option<i64>,
    },

    /// Stamp the store's current time
    ServerTimestamp { field: String },
}

impl FieldUpdate {
    pub fn set(field: &str, value: impl Into<Value>) -> Self {
        FieldUpdate::Set {
            field: field.to_string(),
            value: value.into(),
        }
    }

    pub fn increment(field: &str, delta: i64) -> Self {
        FieldUpdate::Increment {
            field: field.to_string(),
            delta,
            floor: None,
        }
    }

    pub fn increment_floored(field: &str, delta: i64, floor: i64) -> Self {
        FieldUpdate::Increment {
            field: field.to_string(),
            delta,
            floor: Some(floor),
        }
    }

    pub fn server_timestamp(field: &str) -> Self {
        FieldUpdate::ServerTimestamp {
            field: field.to_string(),
        }
    }
}

/// Field-equality guard for conditional updates (missing field equals `null`)
///
/// Every listed field must hold its expected value for the write to apply.
#[derive(Debug, Clone, PartialEq)]
pub struct Precondition {
    checks: Vec<(String, Value)>,
}

impl Precondition {
    pub fn field_equals(field: &str, expected: impl Into<Value>) -> Self {
        Self {
            checks: vec![(field.to_string(), expected.into())],
        }
    }

    /// Also require `field` to equal `expected`
    pub fn and_field_equals(mut self, field: &str, expected: impl Into<Value>) -> Self {
        self.checks.push((field.to_string(), expected.into()));
        self
    }

    /// First field whose current value differs from the expected one
    pub fn first_violation<'a>(&'a self, fields: &Fields) -> Option<&'a str> {
        self.checks
            .iter()
            .find(|(field, expected)| fields.get(field).unwrap_or(&Value::Null) != expected)
            .map(|(field, _)| field.as_str())
    }
}

/// Sort direction for queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

/// Conjunction of field-equality filters plus optional ordering
///
/// # Example
/// ```
/// use rent_ledger_core_rs::store::{Query, CREATED_AT};
///
/// let q = Query::new()
///     .where_eq("landlordId", "landlord-1")
///     .where_eq("status", "active")
///     .order_by_desc(CREATED_AT);
/// assert_eq!(q.filters().len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    filters: Vec<(String, Value)>,
    order_by: Option<OrderBy>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn where_eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filters.push((field.to_string(), value.into()));
        self
    }

    pub fn order_by_desc(mut self, field: &str) -> Self {
        self.order_by = Some(OrderBy {
            field: field.to_string(),
            direction: Direction::Descending,
        });
        self
    }

    pub fn order_by_asc(mut self, field: &str) -> Self {
        self.order_by = Some(OrderBy {
            field: field.to_string(),
            direction: Direction::Ascending,
        });
        self
    }

    pub fn filters(&self) -> &[(String, Value)] {
        &self.filters
    }

    pub fn ordering(&self) -> Option<&OrderBy> {
        self.order_by.as_ref()
    }

    /// Whether a document satisfies every filter
    pub fn matches(&self, fields: &Fields) -> bool {
        self.filters
            .iter()
            .all(|(field, value)| fields.get(field).unwrap_or(&Value::Null) == value)
    }
}

/// Document store used by every ledger component
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, StoreError>;

    /// Insert a new document; the store assigns the id and both timestamps
    async fn create(&self, collection: Collection, fields: Fields) -> Result<Document, StoreError>;

    /// Apply `updates` to one document atomically and return the result
    ///
    /// Fails with `NotFound` if the document is absent and with
    /// `PreconditionFailed` if the guard does not hold. `updatedAt` is stamped on
    /// every successful call.
    async fn update(
        &self,
        collection: Collection,
        id: &str,
        updates: Vec<FieldUpdate>,
        precondition: Option<Precondition>,
    ) -> Result<Document, StoreError>;

    /// Remove a document, returning it if this call removed it
    async fn delete(&self, collection: Collection, id: &str) -> Result<Option<Document>, StoreError>;

    async fn query(&self, collection: Collection, query: &Query) -> Result<Vec<Document>, StoreError>;
}

/// Decode a stored document into a record type, injecting its id
pub fn decode<T: DeserializeOwned>(doc: Document) -> Result<T, StoreError> {
    let Document { id, mut fields } = doc;
    fields.insert("id".to_string(), Value::String(id));
    serde_json::from_value(Value::Object(fields))
        .map_err(|e| StoreError::Serialization(format!("decode failed: {}", e)))
}

/// Encode a record for storage
///
/// Store-owned keys (`id` and the server timestamps) are stripped.
pub fn encode<T: Serialize>(record: &T) -> Result<Fields, StoreError> {
    match serde_json::to_value(record)
        .map_err(|e| StoreError::Serialization(format!("encode failed: {}", e)))?
    {
        Value::Object(mut fields) => {
            fields.remove("id");
            fields.remove(CREATED_AT);
            fields.remove(UPDATED_AT);
            Ok(fields)
        }
        other => Err(StoreError::Serialization(format!(
            "expected an object, got {}",
            other
        ))),
    }
}
