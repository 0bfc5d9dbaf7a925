//! In-memory subscription table.
//!
//! [`SubscriptionTable`] is the keyed-by-endpoint map shared by the memory
//! and file backends. [`MemoryStore`] wraps it for in-process use.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{StoreError, SubscriptionStore};
use crate::subscription::PushSubscriptionRecord;

/// Push subscriptions keyed by endpoint.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct SubscriptionTable {
    /// Maps endpoint → subscription row.
    subscriptions: BTreeMap<String, PushSubscriptionRecord>,
}

impl SubscriptionTable {
    /// Add or overwrite the row for `record.endpoint`.
    ///
    /// Returns `true` if a row with that endpoint already existed.
    pub fn upsert(&mut self, record: PushSubscriptionRecord) -> bool {
        self.subscriptions
            .insert(record.endpoint.clone(), record)
            .is_some()
    }

    /// Look up a row by endpoint.
    pub fn get(&self, endpoint: &str) -> Option<&PushSubscriptionRecord> {
        self.subscriptions.get(endpoint)
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }
}

/// Process-local store. Optionally fails every upsert, for exercising the
/// persistence error path.
#[derive(Debug, Default)]
pub struct MemoryStore {
    table: Mutex<SubscriptionTable>,
    upserts: AtomicUsize,
    fail_with: Option<StoreError>,
}

impl MemoryStore {
    /// Empty store that accepts every upsert.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store whose upserts all fail with `error`.
    pub fn failing(error: StoreError) -> Self {
        Self {
            fail_with: Some(error),
            ..Self::default()
        }
    }

    /// Snapshot of the stored rows.
    pub fn snapshot(&self) -> SubscriptionTable {
        self.table
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// How many times `upsert` was called.
    pub fn upsert_count(&self) -> usize {
        self.upserts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SubscriptionStore for MemoryStore {
    async fn upsert(&self, record: &PushSubscriptionRecord) -> Result<(), StoreError> {
        self.upserts.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = &self.fail_with {
            return Err(err.clone());
        }

        let replaced = self
            .table
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .upsert(record.clone());
        log::debug!(
            "[Store] {} {} in memory",
            if replaced { "Updated" } else { "Inserted" },
            record.endpoint
        );
        Ok(())
    }
}
