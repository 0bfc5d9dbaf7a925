//! Application-wide constants for pushsub.
//!
//! This module centralizes environment variable names, defaults, and the
//! user-facing messages shown at the end of a subscription run.
//!
//! # Categories
//!
//! - **Environment**: variable names read by `Config::load()`
//! - **Defaults**: backend table and push service location
//! - **Timeouts**: network timeouts
//! - **Messages**: alert text for each terminal outcome

use std::time::Duration;

// ============================================================================
// Environment
// ============================================================================

/// Server public key (VAPID, base64url) used as the `applicationServerKey`.
pub const VAPID_PUBLIC_KEY_ENV: &str = "PUSHSUB_VAPID_PUBLIC_KEY";

/// Fallback name for the public key, as exported by Vite frontends.
pub const VITE_VAPID_PUBLIC_KEY_ENV: &str = "VITE_VAPID_PUBLIC_KEY";

/// Base URL of the backend (Supabase project URL or any PostgREST host).
pub const BACKEND_URL_ENV: &str = "PUSHSUB_BACKEND_URL";

/// API key sent as both `apikey` and bearer token to the backend.
pub const BACKEND_KEY_ENV: &str = "PUSHSUB_BACKEND_KEY";

/// Table name override.
pub const TABLE_ENV: &str = "PUSHSUB_TABLE";

/// Push service base URL used by the local registry to mint endpoints.
pub const PUSH_SERVICE_URL_ENV: &str = "PUSHSUB_PUSH_SERVICE_URL";

/// Config directory override.
pub const CONFIG_DIR_ENV: &str = "PUSHSUB_CONFIG_DIR";

// ============================================================================
// Defaults
// ============================================================================

/// Backend table holding one row per push endpoint.
pub const DEFAULT_TABLE: &str = "push_subscriptions";

/// Column the backend upsert conflicts on.
pub const CONFLICT_COLUMN: &str = "endpoint";

/// Push service base URL when none is configured.
pub const DEFAULT_PUSH_SERVICE_URL: &str = "https://push.example";

/// Scope reported by the local registry.
pub const DEFAULT_SCOPE: &str = "/";

/// File name of the settings file inside the config dir.
pub const CONFIG_FILE: &str = "config.json";

/// File name of the `FileStore` table inside the config dir.
pub const SUBSCRIPTIONS_FILE: &str = "push_subscriptions.json";

// ============================================================================
// Timeouts
// ============================================================================

/// HTTP client request timeout for backend calls.
///
/// Applies to each upsert request. The workflow itself adds no timeout of
/// its own, so this bounds the persistence step.
pub const HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// ============================================================================
// Messages
// ============================================================================

/// Shown when the host has no notification permission API.
pub const MSG_UNSUPPORTED: &str = "Notifications are not supported in this environment.";

/// Shown when permission was denied or the prompt was dismissed.
pub const MSG_PERMISSION_DENIED: &str = "Please allow notifications to enable alerts.";

/// Shown after the subscription has been stored.
pub const MSG_SUBSCRIBED: &str = "✅ You have been successfully subscribed to notifications!";

/// Prefix of the failure alert; followed by the error kind and message.
pub const MSG_FAILED_PREFIX: &str = "❌ Failed:";
