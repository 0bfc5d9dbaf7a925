//! Supabase/PostgREST table backend.
//!
//! Upserts go to `POST {base}/rest/v1/{table}?on_conflict=endpoint` with
//! `Prefer: resolution=merge-duplicates`, so an existing row with the same
//! endpoint is updated in place.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;

use super::{StoreError, SubscriptionStore};
use crate::constants;
use crate::subscription::PushSubscriptionRecord;
use crate::Config;

/// HTTP client for a PostgREST-compatible table.
#[derive(Debug, Clone)]
pub struct RestStore {
    client: Client,
    base_url: String,
    api_key: String,
    table: String,
}

impl RestStore {
    /// Creates a store for `table` on the backend at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(base_url: &str, api_key: String, table: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(constants::HTTP_REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self::with_client(client, base_url, api_key, table))
    }

    /// Creates a store with a pre-configured HTTP client.
    pub fn with_client(client: Client, base_url: &str, api_key: String, table: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            table,
        }
    }

    /// Creates a store from the backend settings in `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend URL or key is not configured.
    pub fn from_config(config: &Config) -> Result<Self> {
        let base_url = config.backend_url.as_deref().filter(|u| !u.is_empty()).with_context(|| {
            format!(
                "Backend URL not configured (set {} or use --store file)",
                constants::BACKEND_URL_ENV
            )
        })?;
        let api_key = config.backend_key.clone().filter(|k| !k.is_empty()).with_context(|| {
            format!("Backend key not configured (set {})", constants::BACKEND_KEY_ENV)
        })?;

        Self::new(base_url, api_key, config.table.clone())
    }

    /// URL of the table endpoint, including the conflict target.
    pub fn table_url(&self) -> String {
        format!(
            "{}/rest/v1/{}?on_conflict={}",
            self.base_url,
            self.table,
            constants::CONFLICT_COLUMN
        )
    }
}

#[async_trait]
impl SubscriptionStore for RestStore {
    async fn upsert(&self, record: &PushSubscriptionRecord) -> Result<(), StoreError> {
        let response = self
            .client
            .post(self.table_url())
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&[record])
            .send()
            .await
            .map_err(|e| StoreError::new(format!("TypeError: {e}")).with_code("FetchError"))?;

        let status = response.status();
        if status.is_success() {
            log::info!("[Store] Upserted {} into {}", record.endpoint, self.table);
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        let mut err = serde_json::from_str::<StoreError>(&body)
            .ok()
            .filter(|e| !e.message.is_empty())
            .unwrap_or_else(|| {
                let message = if body.is_empty() {
                    status.canonical_reason().unwrap_or("Request failed").to_string()
                } else {
                    body
                };
                StoreError::new(message)
            });
        err.status = Some(status.as_u16());

        log::warn!("[Store] Upsert into {} failed: {err}", self.table);
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_url_trims_trailing_slash() {
        let store = RestStore::new(
            "https://abc.supabase.co/",
            "anon".to_string(),
            "push_subscriptions".to_string(),
        )
        .expect("client");
        assert_eq!(
            store.table_url(),
            "https://abc.supabase.co/rest/v1/push_subscriptions?on_conflict=endpoint"
        );
    }

    #[test]
    fn test_from_config_requires_backend() {
        let config = Config::default();
        let err = RestStore::from_config(&config).expect_err("no backend configured");
        assert!(err.to_string().contains(constants::BACKEND_URL_ENV));

        let config = Config {
            backend_url: Some("https://abc.supabase.co".to_string()),
            ..Config::default()
        };
        let err = RestStore::from_config(&config).expect_err("no key configured");
        assert!(err.to_string().contains(constants::BACKEND_KEY_ENV));
    }
}
