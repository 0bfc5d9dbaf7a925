//! Push subscription orchestration.
//!
//! # Flow
//!
//! ```text
//! capability check ──✗──▶ UnsupportedEnvironment
//!     ↓
//! permission prompt ──✗──▶ PermissionDenied
//!     ↓
//! service worker ready
//!     ↓
//! VAPID key from config ──✗──▶ ConfigMissing
//!     ↓
//! pushManager.subscribe({ userVisibleOnly: true, applicationServerKey })
//!     ↓
//! base64 p256dh + auth
//!     ↓
//! upsert { endpoint, p256dh, auth } ──✗──▶ Persistence
//!     ↓
//! one alert for whatever happened
//! ```
//!
//! Nothing is retried or rolled back. If the upsert fails, the platform
//! subscription created one step earlier stays active.
//!
//! # Single flight
//!
//! Calls to [`PushSubscriptionManager::subscribe_to_push`] made while a run
//! is in progress join that run and get the same [`Outcome`]. The user sees
//! one prompt and one alert. A run that panics still frees the slot, so the
//! next call starts over.

use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, PoisonError};

use futures_util::future::{BoxFuture, FutureExt, Shared};

use crate::codec;
use crate::constants;
use crate::error::SubscribeError;
use crate::platform::{ConfigReader, Notifier, PermissionProvider, PlatformError, PushRegistry};
use crate::store::SubscriptionStore;
use crate::subscription::{KeyName, PermissionState, PushSubscriptionRecord, SubscribeOptions};

/// Host capabilities the manager drives.
#[derive(Clone)]
pub struct Collaborators {
    /// Notification permission API.
    pub permissions: Arc<dyn PermissionProvider>,
    /// Service worker registry and push manager.
    pub registry: Arc<dyn PushRegistry>,
    /// Configuration source for the VAPID key.
    pub config: Arc<dyn ConfigReader>,
    /// Backend table.
    pub store: Arc<dyn SubscriptionStore>,
    /// User-facing alerts.
    pub notifier: Arc<dyn Notifier>,
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}

/// How a subscription run ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The record was stored.
    Subscribed(PushSubscriptionRecord),
    /// The run stopped early; see [`SubscribeError::is_failure`].
    Aborted(SubscribeError),
}

impl Outcome {
    /// Alert text for this outcome.
    pub fn user_message(&self) -> String {
        match self {
            Self::Subscribed(_) => constants::MSG_SUBSCRIBED.to_string(),
            Self::Aborted(SubscribeError::UnsupportedEnvironment { hint }) => {
                if hint.is_empty() {
                    constants::MSG_UNSUPPORTED.to_string()
                } else {
                    format!("{}\n\n{hint}", constants::MSG_UNSUPPORTED)
                }
            }
            Self::Aborted(SubscribeError::PermissionDenied(_)) => {
                constants::MSG_PERMISSION_DENIED.to_string()
            }
            Self::Aborted(err) => format!(
                "{} {} {}",
                constants::MSG_FAILED_PREFIX,
                err.kind(),
                err.message()
            )
            .trim()
            .to_string(),
        }
    }

    /// Whether a record was stored.
    pub fn is_subscribed(&self) -> bool {
        matches!(self, Self::Subscribed(_))
    }

    /// Process exit code: 1 for failures, 0 otherwise.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Aborted(err) if err.is_failure() => 1,
            _ => 0,
        }
    }
}

impl From<Result<PushSubscriptionRecord, SubscribeError>> for Outcome {
    fn from(result: Result<PushSubscriptionRecord, SubscribeError>) -> Self {
        match result {
            Ok(record) => Self::Subscribed(record),
            Err(err) => Self::Aborted(err),
        }
    }
}

type InFlight = Shared<BoxFuture<'static, Outcome>>;

struct Inner {
    collaborators: Collaborators,
    in_flight: Mutex<Option<InFlight>>,
}

/// Requests permission, subscribes to push, and stores the subscription.
///
/// Cheap to clone; clones share the single-flight slot.
#[derive(Clone)]
pub struct PushSubscriptionManager {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for PushSubscriptionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PushSubscriptionManager")
            .field("in_flight", &self.is_in_flight())
            .finish_non_exhaustive()
    }
}

impl PushSubscriptionManager {
    /// Create a manager over the given host capabilities.
    pub fn new(collaborators: Collaborators) -> Self {
        Self {
            inner: Arc::new(Inner {
                collaborators,
                in_flight: Mutex::new(None),
            }),
        }
    }

    /// Whether a `subscribe_to_push` run is in progress.
    pub fn is_in_flight(&self) -> bool {
        self.in_flight_slot().is_some()
    }

    fn in_flight_slot(&self) -> std::sync::MutexGuard<'_, Option<InFlight>> {
        self.inner
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Run the workflow, report the outcome to the user, never fail.
    ///
    /// Joins the run already in progress, if there is one.
    pub async fn subscribe_to_push(&self) -> Outcome {
        let operation = {
            let mut slot = self.in_flight_slot();
            if let Some(operation) = slot.as_ref() {
                log::debug!("[Push] Subscription already in progress, joining it");
                operation.clone()
            } else {
                let this = self.clone();
                let operation = async move {
                    let result = AssertUnwindSafe(this.run_and_report()).catch_unwind().await;
                    // Clearing here also drops the slot's reference to this future
                    *this.in_flight_slot() = None;
                    match result {
                        Ok(outcome) => outcome,
                        Err(panic) => std::panic::resume_unwind(panic),
                    }
                }
                .boxed()
                .shared();
                *slot = Some(operation.clone());
                operation
            }
        };

        operation.await
    }

    async fn run_and_report(&self) -> Outcome {
        let outcome = Outcome::from(self.run().await);

        match &outcome {
            Outcome::Subscribed(record) => {
                log::info!("[Push] Subscribed {}", record.endpoint);
            }
            Outcome::Aborted(err) if err.is_failure() => {
                log::error!("[Push] Failed to subscribe to push notifications: {err}");
                log::error!("[Push] kind: {}", err.kind());
                log::error!("[Push] message: {}", err.message());
                log::error!("[Push] trace: {}", error_chain(err));
            }
            Outcome::Aborted(err) => {
                log::info!("[Push] Subscription not started: {err}");
            }
        }

        self.inner
            .collaborators
            .notifier
            .alert(&outcome.user_message());
        outcome
    }

    /// Run the workflow without reporting to the user.
    ///
    /// Stops at the first step that does not succeed. Not covered by the
    /// single-flight guard.
    pub async fn run(&self) -> Result<PushSubscriptionRecord, SubscribeError> {
        let Collaborators {
            permissions,
            registry,
            config,
            store,
            ..
        } = &self.inner.collaborators;

        if !permissions.is_supported() {
            return Err(SubscribeError::UnsupportedEnvironment {
                hint: permissions.unsupported_hint(),
            });
        }

        let permission = permissions.request_permission().await;
        log::info!("[Push] Permission result: {permission}");
        if permission != PermissionState::Granted {
            return Err(SubscribeError::PermissionDenied(permission));
        }

        if !registry.supports_service_worker() {
            return Err(PlatformError::service_worker_unsupported().into());
        }
        if !registry.supports_push_manager() {
            return Err(PlatformError::push_unsupported().into());
        }

        let registration = registry.ready().await?;
        log::debug!("[Push] Service worker ready (scope {})", registration.scope);

        let vapid_public_key = config
            .vapid_public_key()
            .filter(|key| !key.is_empty())
            .ok_or(SubscribeError::ConfigMissing {
                key: constants::VAPID_PUBLIC_KEY_ENV,
            })?;
        let application_server_key = codec::base64_url_decode(&vapid_public_key).map_err(|e| {
            PlatformError::new(
                "InvalidCharacterError",
                format!("The VAPID public key is not correctly encoded: {e}"),
            )
        })?;

        let subscription = registry
            .subscribe(
                &registration,
                SubscribeOptions {
                    user_visible_only: true,
                    application_server_key,
                },
            )
            .await?;
        log::info!("[Push] Push subscription successful: {subscription:?}");

        let record = PushSubscriptionRecord {
            p256dh: codec::base64_std_encode(subscription.get_key(KeyName::P256dh)),
            auth: codec::base64_std_encode(subscription.get_key(KeyName::Auth)),
            endpoint: subscription.endpoint,
        };

        store.upsert(&record).await?;
        Ok(record)
    }
}

/// Debug form of an error followed by its `source()` chain.
fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut trace = format!("{err:?}");
    let mut source = err.source();
    while let Some(cause) = source {
        trace.push_str(&format!("\n  caused by: {cause}"));
        source = cause.source();
    }
    trace
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreError;

    #[test]
    fn test_user_messages() {
        let record = PushSubscriptionRecord {
            endpoint: "https://push.example/abc".to_string(),
            p256dh: String::new(),
            auth: String::new(),
        };
        assert_eq!(
            Outcome::Subscribed(record).user_message(),
            "✅ You have been successfully subscribed to notifications!"
        );
        assert_eq!(
            Outcome::Aborted(SubscribeError::PermissionDenied(PermissionState::Default))
                .user_message(),
            "Please allow notifications to enable alerts."
        );
        assert_eq!(
            Outcome::Aborted(SubscribeError::UnsupportedEnvironment {
                hint: "Use a terminal".to_string()
            })
            .user_message(),
            "Notifications are not supported in this environment.\n\nUse a terminal"
        );
        assert_eq!(
            Outcome::Aborted(SubscribeError::Persistence(
                StoreError::new("permission denied for table push_subscriptions").with_code("42501")
            ))
            .user_message(),
            "❌ Failed: 42501 permission denied for table push_subscriptions"
        );
        assert_eq!(
            Outcome::Aborted(SubscribeError::Platform(PlatformError::new("AbortError", "")))
                .user_message(),
            "❌ Failed: AbortError"
        );
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(
            Outcome::Aborted(SubscribeError::PermissionDenied(PermissionState::Denied)).exit_code(),
            0
        );
        assert_eq!(
            Outcome::Aborted(SubscribeError::ConfigMissing { key: "K" }).exit_code(),
            1
        );
    }

    #[test]
    fn test_error_chain_lists_sources() {
        let err = SubscribeError::Persistence(StoreError::new("offline").with_code("FetchError"));
        let trace = error_chain(&err);
        assert!(trace.starts_with("Persistence("));
        assert!(trace.contains("caused by: FetchError: offline"));
    }
}
