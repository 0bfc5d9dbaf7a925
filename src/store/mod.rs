//! Backend persistence for push subscriptions.
//!
//! Every backend upserts rows keyed by `endpoint`, so a device that
//! subscribes again overwrites its row instead of adding a duplicate.
//!
//! # Backends
//!
//! - [`RestStore`] - Supabase/PostgREST table over HTTP
//! - [`FileStore`] - JSON file in the config directory
//! - [`MemoryStore`] - in-process table, for dry runs and tests
//!
//! [`open`] picks one from a [`StoreKind`]. A backend that cannot be set up
//! becomes an [`UnavailableStore`], so the problem surfaces as a failed
//! upsert and reaches the user through the normal failure alert.

pub mod file;
pub mod memory;
pub mod rest;

pub use file::FileStore;
pub use memory::{MemoryStore, SubscriptionTable};
pub use rest::RestStore;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::Config;
use crate::subscription::PushSubscriptionRecord;

/// Error reported by a store, shaped like a PostgREST error body.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct StoreError {
    /// Backend error code (e.g. `42501`, `PGRST204`), when one was given.
    #[serde(default)]
    pub code: Option<String>,
    /// Human-readable message.
    #[serde(default)]
    pub message: String,
    /// Extra detail from the backend.
    #[serde(default)]
    pub details: Option<String>,
    /// Backend hint for fixing the request.
    #[serde(default)]
    pub hint: Option<String>,
    /// HTTP status, for HTTP backends.
    #[serde(skip)]
    pub status: Option<u16>,
}

impl StoreError {
    /// Error with only a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    /// Set the error code.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Name used when reporting this error to the user.
    pub fn kind(&self) -> &str {
        match self.code.as_deref() {
            Some(code) if !code.is_empty() => code,
            _ => "PersistenceError",
        }
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind(), self.message)?;
        if let Some(status) = self.status {
            write!(f, " (HTTP {status})")?;
        }
        if let Some(details) = self.details.as_deref().filter(|d| !d.is_empty()) {
            write!(f, " - {details}")?;
        }
        Ok(())
    }
}

impl std::error::Error for StoreError {}

/// A table of push subscriptions keyed uniquely by endpoint.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Insert the record, or overwrite the row with the same endpoint.
    async fn upsert(&self, record: &PushSubscriptionRecord) -> Result<(), StoreError>;
}

/// Which backend receives the subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum StoreKind {
    /// Supabase/PostgREST table over HTTP
    Rest,
    /// JSON file in the config directory
    File,
    /// In-process only (dry run)
    Memory,
}

/// A backend that could not be set up. Every upsert fails with the setup error.
#[derive(Clone, Debug)]
pub struct UnavailableStore {
    error: StoreError,
}

impl UnavailableStore {
    /// Store that rejects every upsert with `error`.
    pub fn new(error: StoreError) -> Self {
        Self { error }
    }
}

#[async_trait]
impl SubscriptionStore for UnavailableStore {
    async fn upsert(&self, _record: &PushSubscriptionRecord) -> Result<(), StoreError> {
        Err(self.error.clone())
    }
}

/// Open the backend selected by `kind`.
///
/// Never fails. Setup errors (no backend URL, no config dir) are deferred to
/// the first upsert with code `StoreUnavailable`.
pub fn open(kind: StoreKind, config: &Config) -> Arc<dyn SubscriptionStore> {
    let opened: anyhow::Result<Arc<dyn SubscriptionStore>> = match kind {
        StoreKind::Rest => RestStore::from_config(config)
            .map(|store| Arc::new(store) as Arc<dyn SubscriptionStore>),
        StoreKind::File => Config::subscriptions_path()
            .map(|path| Arc::new(FileStore::new(path)) as Arc<dyn SubscriptionStore>),
        StoreKind::Memory => Ok(Arc::new(MemoryStore::new())),
    };

    opened.unwrap_or_else(|err| {
        log::warn!("[Store] {kind:?} backend unavailable: {err:#}");
        Arc::new(UnavailableStore::new(
            StoreError::new(format!("{err:#}")).with_code("StoreUnavailable"),
        ))
    })
}
