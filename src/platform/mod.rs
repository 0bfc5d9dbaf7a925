//! Capability interfaces for the host platform.
//!
//! The manager never touches ambient globals. Everything it needs from the
//! host comes through these traits, so the workflow runs the same against a
//! terminal, a test fake, or any other host that can provide them.
//!
//! # Architecture
//!
//! ```text
//! PermissionProvider (trait)
//!     └── TerminalPermission   (stdin prompt, or --yes)
//!
//! PushRegistry (trait)
//!     └── LocalPushRegistry    (mints P-256 subscriptions in process)
//!
//! ConfigReader (trait)
//!     └── Config               (config.json + env overrides)
//!
//! Notifier (trait)
//!     └── ConsoleNotifier      (prints alerts to stdout)
//! ```

pub mod local;
pub mod terminal;

pub use local::LocalPushRegistry;
pub use terminal::{ConsoleNotifier, TerminalPermission};

use async_trait::async_trait;

use crate::subscription::{PermissionState, PlatformSubscription, Registration, SubscribeOptions};

/// Error raised by a platform call, named like a DOM exception.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlatformError {
    /// Exception name (e.g. `NotAllowedError`).
    pub name: String,
    /// Human-readable detail.
    pub message: String,
}

impl PlatformError {
    /// Create a named platform error.
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }

    /// The host has no service worker support.
    pub fn service_worker_unsupported() -> Self {
        Self::new("NotSupportedError", "Service Worker not supported")
    }

    /// The host has no push manager.
    pub fn push_unsupported() -> Self {
        Self::new("NotSupportedError", "Push notifications not supported")
    }
}

impl std::fmt::Display for PlatformError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.name, self.message)
    }
}

impl std::error::Error for PlatformError {}

/// Notification permission API.
#[async_trait]
pub trait PermissionProvider: Send + Sync {
    /// Whether the host has a permission API at all.
    fn is_supported(&self) -> bool;

    /// Guidance shown to the user when [`is_supported`](Self::is_supported) is false.
    fn unsupported_hint(&self) -> String;

    /// Prompt the user and wait for their decision.
    ///
    /// Always resolves; a dismissed prompt is [`PermissionState::Default`].
    async fn request_permission(&self) -> PermissionState;
}

/// Service worker registry and its push manager.
///
/// Installing or updating the worker is the host's job at startup; this
/// trait only waits for the registration to be ready.
#[async_trait]
pub trait PushRegistry: Send + Sync {
    /// Whether the host supports service workers.
    fn supports_service_worker(&self) -> bool {
        true
    }

    /// Whether the host exposes a push manager.
    fn supports_push_manager(&self) -> bool {
        true
    }

    /// Wait for the active registration for this origin.
    async fn ready(&self) -> Result<Registration, PlatformError>;

    /// Subscribe the registration to push.
    async fn subscribe(
        &self,
        registration: &Registration,
        options: SubscribeOptions,
    ) -> Result<PlatformSubscription, PlatformError>;
}

/// Read-only access to configuration the workflow needs.
pub trait ConfigReader: Send + Sync {
    /// Server public key (base64url), if configured.
    fn vapid_public_key(&self) -> Option<String>;
}

/// User-facing message channel (one blocking alert per outcome).
pub trait Notifier: Send + Sync {
    /// Show a message to the user.
    fn alert(&self, message: &str);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_error_display() {
        let err = PlatformError::new("NotAllowedError", "Registration failed - permission denied");
        assert_eq!(
            err.to_string(),
            "NotAllowedError: Registration failed - permission denied"
        );
        assert_eq!(
            PlatformError::push_unsupported().message,
            "Push notifications not supported"
        );
        assert_eq!(
            PlatformError::service_worker_unsupported().name,
            "NotSupportedError"
        );
    }
}
