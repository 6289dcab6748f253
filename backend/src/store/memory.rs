//! In-memory record store
//!
//! A process-local [`RecordStore`] with the same semantics a hosted document
//! store offers: store-assigned UUID ids, server timestamps from an injected
//! [`Clock`], atomic single-document updates and equality queries.
//!
//! Failure injection (`fail_next`, `fail_always`) lets tests reproduce the
//! partial-failure windows between two writes.

use super::snapshot::{compute_digest, DocumentSnapshot, StoreSnapshot};
use super::{
    Collection, Direction, Document, FieldUpdate, Fields, Precondition, Query, RecordStore,
    StoreError, CREATED_AT, UPDATED_AT,
};
use crate::core::clock::{Clock, SystemClock};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Store operations that can be targeted by injected faults
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    Get,
    Create,
    Update,
    Delete,
    Query,
}

#[derive(Debug, Clone)]
struct FaultRule {
    op: StoreOp,
    collection: Collection,
    /// `None` matches every document in the collection
    id: Option<String>,
    /// `None` fails forever
    remaining: Option<usize>,
}

#[derive(Debug, Clone)]
struct Entry {
    /// Insertion sequence, used to break ordering ties deterministically
    seq: u64,
    fields: Fields,
}

#[derive(Debug, Default)]
struct Inner {
    collections: BTreeMap<Collection, BTreeMap<String, Entry>>,
    next_seq: u64,
    faults: Vec<FaultRule>,
}

impl Inner {
    fn check_fault(
        &mut self,
        op: StoreOp,
        collection: Collection,
        id: Option<&str>,
    ) -> Result<(), StoreError> {
        let hit = self.faults.iter().position(|rule| {
            rule.op == op
                && rule.collection == collection
                && match (&rule.id, id) {
                    (None, _) => true,
                    (Some(target), Some(id)) => target == id,
                    (Some(_), None) => false,
                }
        });

        let Some(index) = hit else {
            return Ok(());
        };

        if let Some(remaining) = self.faults[index].remaining.as_mut() {
            *remaining -= 1;
            if *remaining == 0 {
                self.faults.remove(index);
            }
        }

        Err(StoreError::Unavailable(format!(
            "injected {:?} failure on {}{}",
            op,
            collection,
            id.map(|id| format!("/{}", id)).unwrap_or_default()
        )))
    }

    fn collection_mut(&mut self, collection: Collection) -> &mut BTreeMap<String, Entry> {
        self.collections.entry(collection).or_default()
    }
}

/// Process-local document store
///
/// # Example
/// ```
/// use rent_ledger_core_rs::store::{Collection, FieldUpdate, InMemoryStore, RecordStore};
/// use serde_json::json;
///
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// let store = InMemoryStore::new();
/// let fields = json!({"occupiedUnits": 0}).as_object().cloned().unwrap();
/// let doc = store.create(Collection::Properties, fields).await.unwrap();
///
/// let updated = store
///     .update(
///         Collection::Properties,
///         &doc.id,
///         vec![FieldUpdate::increment("occupiedUnits", 1)],
///         None,
///     )
///     .await
///     .unwrap();
/// assert_eq!(updated.int_field("occupiedUnits"), 1);
/// # });
/// ```
pub struct InMemoryStore {
    clock: Arc<dyn Clock>,
    inner: Mutex<Inner>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    /// Store stamping real time
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Store stamping time from `clock`
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Clock the store stamps server timestamps with
    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    /// Make the next matching operation fail with `StoreError::Unavailable`
    pub async fn fail_next(&self, op: StoreOp, collection: Collection, id: Option<&str>) {
        self.push_fault(op, collection, id, Some(1)).await;
    }

    /// Make every matching operation fail until [`InMemoryStore::clear_faults`]
    pub async fn fail_always(&self, op: StoreOp, collection: Collection, id: Option<&str>) {
        self.push_fault(op, collection, id, None).await;
    }

    pub async fn clear_faults(&self) {
        self.inner.lock().await.faults.clear();
    }

    async fn push_fault(
        &self,
        op: StoreOp,
        collection: Collection,
        id: Option<&str>,
        remaining: Option<usize>,
    ) {
        self.inner.lock().await.faults.push(FaultRule {
            op,
            collection,
            id: id.map(str::to_string),
            remaining,
        });
    }

    /// Number of documents in a collection
    pub async fn len(&self, collection: Collection) -> usize {
        self.inner
            .lock()
            .await
            .collections
            .get(&collection)
            .map_or(0, BTreeMap::len)
    }

    pub async fn is_empty(&self, collection: Collection) -> bool {
        self.len(collection).await == 0
    }

    /// Export every collection with an integrity digest
    pub async fn snapshot(&self) -> Result<StoreSnapshot, StoreError> {
        let inner = self.inner.lock().await;
        let mut collections = BTreeMap::new();
        for collection in Collection::ALL {
            let mut docs: Vec<DocumentSnapshot> = inner
                .collections
                .get(&collection)
                .map(|docs| {
                    docs.iter()
                        .map(|(id, entry)| DocumentSnapshot {
                            id: id.clone(),
                            seq: entry.seq,
                            fields: entry.fields.clone(),
                        })
                        .collect()
                })
                .unwrap_or_default();
            docs.sort_by_key(|doc| doc.seq);
            collections.insert(collection, docs);
        }
        let digest = compute_digest(&collections)?;
        Ok(StoreSnapshot {
            next_seq: inner.next_seq,
            collections,
            digest,
        })
    }

    /// Rebuild a store from a snapshot after verifying its digest
    pub fn restore(snapshot: StoreSnapshot, clock: Arc<dyn Clock>) -> Result<Self, StoreError> {
        let actual = compute_digest(&snapshot.collections)?;
        if actual != snapshot.digest {
            return Err(StoreError::SnapshotMismatch {
                expected: snapshot.digest,
                actual,
            });
        }

        let mut inner = Inner {
            next_seq: snapshot.next_seq,
            ..Inner::default()
        };
        for (collection, docs) in snapshot.collections {
            let target = inner.collection_mut(collection);
            for doc in docs {
                target.insert(
                    doc.id,
                    Entry {
                        seq: doc.seq,
                        fields: doc.fields,
                    },
                );
            }
        }

        Ok(Self {
            clock,
            inner: Mutex::new(inner),
        })
    }

    fn timestamp(&self) -> Value {
        Value::String(self.clock.now().to_rfc3339())
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, StoreError> {
        let mut inner = self.inner.lock().await;
        inner.check_fault(StoreOp::Get, collection, Some(id))?;
        Ok(inner
            .collections
            .get(&collection)
            .and_then(|docs| docs.get(id))
            .map(|entry| Document {
                id: id.to_string(),
                fields: entry.fields.clone(),
            }))
    }

    async fn create(&self, collection: Collection, mut fields: Fields) -> Result<Document, StoreError> {
        let mut inner = self.inner.lock().await;
        inner.check_fault(StoreOp::Create, collection, None)?;

        let id = uuid::Uuid::new_v4().to_string();
        let now = self.timestamp();
        fields.insert(CREATED_AT.to_string(), now.clone());
        fields.insert(UPDATED_AT.to_string(), now);

        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.collection_mut(collection).insert(
            id.clone(),
            Entry {
                seq,
                fields: fields.clone(),
            },
        );

        Ok(Document { id, fields })
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        updates: Vec<FieldUpdate>,
        precondition: Option<Precondition>,
    ) -> Result<Document, StoreError> {
        let mut inner = self.inner.lock().await;
        inner.check_fault(StoreOp::Update, collection, Some(id))?;
        let now = self.timestamp();

        let entry = inner
            .collections
            .get_mut(&collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| StoreError::NotFound {
                collection,
                id: id.to_string(),
            })?;

        if let Some(field) = precondition
            .as_ref()
            .and_then(|guard| guard.first_violation(&entry.fields))
        {
            return Err(StoreError::PreconditionFailed {
                collection,
                id: id.to_string(),
                field: field.to_string(),
            });
        }

        // Apply to a copy so a failing write leaves the document untouched.
        let mut fields = entry.fields.clone();
        for update in updates {
            match update {
                FieldUpdate::Set { field, value } => {
                    fields.insert(field, value);
                }
                FieldUpdate::Increment {
                    field,
                    delta,
                    floor,
                } => {
                    let current = match fields.get(&field) {
                        None | Some(Value::Null) => 0,
                        Some(value) => value.as_i64().ok_or_else(|| StoreError::NotNumeric {
                            collection,
                            id: id.to_string(),
                            field: field.clone(),
                        })?,
                    };
                    let mut next = current.saturating_add(delta);
                    if let Some(floor) = floor {
                        next = next.max(floor);
                    }
                    fields.insert(field, Value::from(next));
                }
                FieldUpdate::ServerTimestamp { field } => {
                    fields.insert(field, now.clone());
                }
            }
        }
        fields.insert(UPDATED_AT.to_string(), now);
        entry.fields = fields.clone();

        Ok(Document {
            id: id.to_string(),
            fields,
        })
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<Option<Document>, StoreError> {
        let mut inner = self.inner.lock().await;
        inner.check_fault(StoreOp::Delete, collection, Some(id))?;
        Ok(inner
            .collections
            .get_mut(&collection)
            .and_then(|docs| docs.remove(id))
            .map(|entry| Document {
                id: id.to_string(),
                fields: entry.fields,
            }))
    }

    async fn query(&self, collection: Collection, query: &Query) -> Result<Vec<Document>, StoreError> {
        let mut inner = self.inner.lock().await;
        inner.check_fault(StoreOp::Query, collection, None)?;

        let mut hits: Vec<(u64, Document)> = inner
            .collections
            .get(&collection)
            .map(|docs| {
                docs.iter()
                    .filter(|(_, entry)| query.matches(&entry.fields))
                    .map(|(id, entry)| {
                        (
                            entry.seq,
                            Document {
                                id: id.clone(),
                                fields: entry.fields.clone(),
                            },
                        )
                    })
                    .collect()
            })
            .unwrap_or_default();

        match query.ordering() {
            Some(order) => hits.sort_by(|(seq_a, a), (seq_b, b)| {
                let ordering =
                    compare_values(a.field(&order.field), b.field(&order.field)).then(seq_a.cmp(seq_b));
                match order.direction {
                    Direction::Ascending => ordering,
                    Direction::Descending => ordering.reverse(),
                }
            }),
            None => hits.sort_by_key(|(seq, _)| *seq),
        }

        Ok(hits.into_iter().map(|(_, doc)| doc).collect())
    }
}

/// Total order over JSON scalars used for query ordering
///
/// `null` sorts first; RFC 3339 strings compare as instants; numbers compare
/// numerically; anything else falls back to its string form.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => x
                .as_f64()
                .partial_cmp(&y.as_f64())
                .unwrap_or(Ordering::Equal),
        },
        (Value::String(x), Value::String(y)) => {
            match (
                DateTime::parse_from_rfc3339(x),
                DateTime::parse_from_rfc3339(y),
            ) {
                (Ok(x), Ok(y)) => x.with_timezone(&Utc).cmp(&y.with_timezone(&Utc)),
                _ => x.cmp(y),
            }
        }
        _ => a.to_string().cmp(&b.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_compare_values_orders_timestamps_by_instant() {
        let earlier = json!("2025-03-01T10:00:00+03:00");
        let later = json!("2025-03-01T08:00:00Z");
        assert_eq!(compare_values(&earlier, &later), Ordering::Less);
    }

    #[test]
    fn test_compare_values_null_first() {
        assert_eq!(compare_values(&Value::Null, &json!(0)), Ordering::Less);
    }
}
