//! pushsub - web push subscription workflow.
//!
//! This crate asks the user for notification permission, subscribes a
//! ready service-worker registration to a push service, and stores the
//! resulting subscription credentials in a backend table keyed by endpoint.
//!
//! # Architecture
//!
//! ```text
//! PushSubscriptionManager
//!     │
//!     ├── PermissionProvider   (capability check + permission prompt)
//!     ├── PushRegistry         (ready registration + push subscribe)
//!     ├── ConfigReader         (VAPID public key)
//!     ├── SubscriptionStore    (upsert keyed by endpoint)
//!     └── Notifier             (one user-facing alert per run)
//! ```
//!
//! # Modules
//!
//! - [`codec`] - base64url → bytes and bytes → standard base64
//! - [`subscription`] - records and platform data types
//! - [`platform`] - capability traits and the terminal/local adapters
//! - [`store`] - persistence backends (REST table, JSON file, memory)
//! - [`manager`] - the orchestration and its single-flight guard
//! - [`config`] - configuration loading/saving

pub mod codec;
pub mod config;
pub mod constants;
pub mod error;
pub mod manager;
pub mod platform;
pub mod store;
pub mod subscription;
pub mod vapid;

// Re-export commonly used types
pub use config::Config;
pub use error::SubscribeError;
pub use manager::{Collaborators, Outcome, PushSubscriptionManager};
pub use subscription::{PermissionState, PushSubscriptionRecord};
