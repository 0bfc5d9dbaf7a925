//! Error kinds for the subscription workflow.

use crate::platform::PlatformError;
use crate::store::StoreError;
use crate::subscription::PermissionState;

/// Why a subscription run stopped before storing a record.
///
/// The first two variants are expected terminal outcomes rather than
/// failures; see [`is_failure`](Self::is_failure).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubscribeError {
    /// The host has no notification permission API.
    UnsupportedEnvironment {
        /// Platform-specific guidance for the user.
        hint: String,
    },
    /// The user denied or dismissed the permission prompt.
    PermissionDenied(PermissionState),
    /// A required configuration value is absent.
    ConfigMissing {
        /// Name of the missing setting.
        key: &'static str,
    },
    /// A service worker, push manager, or key decoding step failed.
    Platform(PlatformError),
    /// The backend rejected the upsert.
    Persistence(StoreError),
}

impl SubscribeError {
    /// Error name reported to the user.
    pub fn kind(&self) -> &str {
        match self {
            Self::UnsupportedEnvironment { .. } => "UnsupportedEnvironment",
            Self::PermissionDenied(_) => "PermissionDenied",
            Self::ConfigMissing { .. } => "ConfigMissing",
            Self::Platform(err) => err.name.as_str(),
            Self::Persistence(err) => err.kind(),
        }
    }

    /// Error message reported to the user.
    pub fn message(&self) -> String {
        match self {
            Self::UnsupportedEnvironment { .. } => {
                "Notification API not available".to_string()
            }
            Self::PermissionDenied(state) => format!("Permission result: {state}"),
            Self::ConfigMissing { key } => format!("Missing {key} in env"),
            Self::Platform(err) => err.message.clone(),
            Self::Persistence(err) => err.message.clone(),
        }
    }

    /// `false` for outcomes the user caused or the host cannot avoid.
    pub fn is_failure(&self) -> bool {
        !matches!(
            self,
            Self::UnsupportedEnvironment { .. } | Self::PermissionDenied(_)
        )
    }
}

impl std::fmt::Display for SubscribeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind(), self.message())
    }
}

impl std::error::Error for SubscribeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Platform(err) => Some(err),
            Self::Persistence(err) => Some(err),
            _ => None,
        }
    }
}

impl From<PlatformError> for SubscribeError {
    fn from(err: PlatformError) -> Self {
        Self::Platform(err)
    }
}

impl From<StoreError> for SubscribeError {
    fn from(err: StoreError) -> Self {
        Self::Persistence(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_expected_outcomes_are_not_failures() {
        assert!(!SubscribeError::UnsupportedEnvironment {
            hint: String::new()
        }
        .is_failure());
        assert!(!SubscribeError::PermissionDenied(PermissionState::Denied).is_failure());
        assert!(SubscribeError::ConfigMissing { key: "X" }.is_failure());
        assert!(SubscribeError::Platform(PlatformError::push_unsupported()).is_failure());
        assert!(SubscribeError::Persistence(StoreError::new("x")).is_failure());
    }

    #[test]
    fn test_kind_and_message() {
        let err = SubscribeError::ConfigMissing {
            key: "PUSHSUB_VAPID_PUBLIC_KEY",
        };
        assert_eq!(err.kind(), "ConfigMissing");
        assert_eq!(err.message(), "Missing PUSHSUB_VAPID_PUBLIC_KEY in env");

        let err: SubscribeError = PlatformError::new("AbortError", "push service error").into();
        assert_eq!(err.kind(), "AbortError");
        assert_eq!(err.to_string(), "AbortError: push service error");
        assert!(err.source().is_some());

        let err: SubscribeError = StoreError::new("permission denied for table")
            .with_code("42501")
            .into();
        assert_eq!(err.kind(), "42501");
        assert_eq!(err.message(), "permission denied for table");
    }
}
