//! JSON file backend.
//!
//! Reads the whole table, upserts the row, and writes it back with
//! owner-only permissions. Upserts within a process are serialized.

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{StoreError, SubscriptionStore, SubscriptionTable};
use crate::subscription::PushSubscriptionRecord;

/// Subscription table persisted to a JSON file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Store backed by `path`. The file is created on first upsert.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the table, or an empty one if the file does not exist yet.
    pub async fn load(&self) -> Result<SubscriptionTable, StoreError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => serde_json::from_str(&content).map_err(|e| {
                StoreError::new(format!("Corrupt table {}: {e}", self.path.display()))
                    .with_code("FileError")
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(SubscriptionTable::default()),
            Err(e) => Err(io_error(&self.path, &e)),
        }
    }

    async fn save(&self, table: &SubscriptionTable) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error(parent, &e))?;
        }

        let json = serde_json::to_string_pretty(table).map_err(|e| {
            StoreError::new(format!("Failed to serialize table: {e}")).with_code("FileError")
        })?;
        tokio::fs::write(&self.path, json)
            .await
            .map_err(|e| io_error(&self.path, &e))?;

        // Set restrictive permissions (owner read/write only)
        #[cfg(unix)]
        tokio::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
            .await
            .map_err(|e| io_error(&self.path, &e))?;

        Ok(())
    }
}

fn io_error(path: &Path, err: &std::io::Error) -> StoreError {
    StoreError::new(format!("{}: {err}", path.display())).with_code("FileError")
}

#[async_trait]
impl SubscriptionStore for FileStore {
    async fn upsert(&self, record: &PushSubscriptionRecord) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;

        let mut table = self.load().await?;
        let replaced = table.upsert(record.clone());
        self.save(&table).await?;

        log::info!(
            "[Store] {} {} in {} ({} rows)",
            if replaced { "Updated" } else { "Inserted" },
            record.endpoint,
            self.path.display(),
            table.len()
        );
        Ok(())
    }
}
