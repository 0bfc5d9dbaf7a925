//! Push subscription data types.
//!
//! [`PushSubscriptionRecord`] is the row written to the backend. The other
//! types model what the platform hands back while the workflow runs.

use serde::{Deserialize, Serialize};

/// A stored push subscription, keyed uniquely by `endpoint`.
///
/// Serialized as-is for the backend upsert.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushSubscriptionRecord {
    /// Push service endpoint URL.
    pub endpoint: String,
    /// P-256 ECDH public key of the subscription (standard base64).
    pub p256dh: String,
    /// Shared auth secret (standard base64).
    pub auth: String,
}

/// Result of a notification permission request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionState {
    /// The user allowed notifications.
    Granted,
    /// The user blocked notifications.
    Denied,
    /// The prompt was dismissed without a decision.
    Default,
}

impl std::fmt::Display for PermissionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Granted => write!(f, "granted"),
            Self::Denied => write!(f, "denied"),
            Self::Default => write!(f, "default"),
        }
    }
}

/// Options passed to the push manager's subscribe call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubscribeOptions {
    /// Every push must result in a visible notification.
    pub user_visible_only: bool,
    /// Decoded server public key (VAPID).
    pub application_server_key: Vec<u8>,
}

/// A ready service-worker registration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Registration {
    /// Scope the worker controls.
    pub scope: String,
}

/// Name of a key exposed by a platform subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyName {
    /// Subscription public key.
    P256dh,
    /// Authentication secret.
    Auth,
}

impl KeyName {
    /// Name used by the push API and the backend columns.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::P256dh => "p256dh",
            Self::Auth => "auth",
        }
    }
}

/// Subscription returned by the platform's push manager.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PlatformSubscription {
    /// Endpoint assigned by the push service.
    pub endpoint: String,
    /// Raw `p256dh` key bytes, if the platform exposed them.
    pub p256dh: Option<Vec<u8>>,
    /// Raw `auth` secret bytes, if the platform exposed them.
    pub auth: Option<Vec<u8>>,
}

impl PlatformSubscription {
    /// Binary key material by name, `None` when the platform returned none.
    pub fn get_key(&self, name: KeyName) -> Option<&[u8]> {
        match name {
            KeyName::P256dh => self.p256dh.as_deref(),
            KeyName::Auth => self.auth.as_deref(),
        }
    }
}
