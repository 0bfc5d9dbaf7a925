//! In-process push manager for hosts without a browser.
//!
//! Mints subscriptions the way a user agent does: a fresh P-256 ECDH
//! keypair, a 16-byte auth secret, and an endpoint under the configured push
//! service. Subscribe follows browser rules for `userVisibleOnly`, key
//! validation, and re-subscription with the same or a different server key.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use p256::elliptic_curve::rand_core::OsRng;
use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::{PublicKey, SecretKey};

use super::{PlatformError, PushRegistry};
use crate::constants;
use crate::subscription::{PlatformSubscription, Registration, SubscribeOptions};

/// Length of the auth secret in bytes.
const AUTH_SECRET_LEN: usize = 16;

#[derive(Debug)]
struct ActiveSubscription {
    server_key: Vec<u8>,
    subscription: PlatformSubscription,
}

/// Local push registry with at most one active subscription.
#[derive(Debug)]
pub struct LocalPushRegistry {
    scope: String,
    push_service_url: String,
    active: Mutex<Option<ActiveSubscription>>,
}

impl LocalPushRegistry {
    /// Create a registry that mints endpoints under `push_service_url`.
    pub fn new(push_service_url: impl Into<String>) -> Self {
        Self {
            scope: constants::DEFAULT_SCOPE.to_string(),
            push_service_url: push_service_url.into().trim_end_matches('/').to_string(),
            active: Mutex::new(None),
        }
    }

    fn mint(&self) -> PlatformSubscription {
        let secret = SecretKey::random(&mut OsRng);
        // SEC1 uncompressed public key (65 bytes: 0x04 || x || y)
        let p256dh = secret.public_key().to_encoded_point(false).as_bytes().to_vec();
        let auth: [u8; AUTH_SECRET_LEN] = rand::random();

        PlatformSubscription {
            endpoint: format!("{}/{}", self.push_service_url, uuid::Uuid::new_v4()),
            p256dh: Some(p256dh),
            auth: Some(auth.to_vec()),
        }
    }
}

fn validate_server_key(key: &[u8]) -> Result<(), PlatformError> {
    if key.len() != 65 || key[0] != 0x04 || PublicKey::from_sec1_bytes(key).is_err() {
        return Err(PlatformError::new(
            "InvalidAccessError",
            "The provided applicationServerKey is not valid.",
        ));
    }
    Ok(())
}

#[async_trait]
impl PushRegistry for LocalPushRegistry {
    async fn ready(&self) -> Result<Registration, PlatformError> {
        Ok(Registration {
            scope: self.scope.clone(),
        })
    }

    async fn subscribe(
        &self,
        registration: &Registration,
        options: SubscribeOptions,
    ) -> Result<PlatformSubscription, PlatformError> {
        if !options.user_visible_only {
            return Err(PlatformError::new(
                "NotAllowedError",
                "Push subscriptions that don't enable userVisibleOnly are not supported.",
            ));
        }
        validate_server_key(&options.application_server_key)?;

        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = active.as_ref() {
            if existing.server_key != options.application_server_key {
                return Err(PlatformError::new(
                    "InvalidStateError",
                    "A subscription with a different applicationServerKey already exists.",
                ));
            }
            log::debug!(
                "[Push] Reusing existing subscription for scope {}",
                registration.scope
            );
            return Ok(existing.subscription.clone());
        }

        let subscription = self.mint();
        log::debug!(
            "[Push] Minted subscription {} for scope {}",
            subscription.endpoint,
            registration.scope
        );
        *active = Some(ActiveSubscription {
            server_key: options.application_server_key,
            subscription: subscription.clone(),
        });
        Ok(subscription)
    }
}
