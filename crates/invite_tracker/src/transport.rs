//! Notification transport seam.
//!
//! The chat backend itself is a collaborator outside this crate; the
//! tracker only needs a narrow contract: readiness, send-returning-an-id,
//! and fire-and-forget delete. [`TransportManager`] owns the live transport
//! instance and the credential it was started with, so reloads can restart
//! the transport only when the credential actually changed.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Content of one outbound join notification.
///
/// Carries everything the transport needs to render the message; how it is
/// rendered (embeds, colors, ...) is the transport's business.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinNotice {
    /// Channel to post into
    pub channel_id: String,
    /// Mention/ping of the owning identity
    pub ping_content: String,
    /// Milestone announcement when a milestone was just reached, plain
    /// new-join announcement otherwise
    pub title: String,
    /// Display name of the player who joined
    pub player_name: String,
    /// Domain the player connected through
    pub domain: String,
    /// Cumulative unique-join count for the owner/domain pair
    pub total_count: u64,
    /// Index of the highest milestone at or below the count
    pub milestone_index: u32,
    /// Milestone number just reached, 0 if none
    pub milestone_just_reached: u32,
}

/// Contract the chat backend has to fulfil.
///
/// Send failures surface as `None`; deletes are advisory cleanup and
/// swallow their errors. Neither is ever retried.
#[async_trait]
pub trait NotificationTransport: Send + Sync {
    /// Whether the transport is connected and able to deliver.
    fn is_ready(&self) -> bool;

    /// Posts a notification and returns the new message id, or `None` on
    /// failure or when not ready.
    async fn send(&self, notice: &JoinNotice) -> Option<String>;

    /// Requests deletion of a previously posted message. Fire-and-forget.
    async fn delete(&self, channel_id: &str, message_id: &str);

    /// Releases transport resources. Default is a no-op.
    async fn shutdown(&self) {}
}

/// Builds transport instances from a credential.
pub trait TransportFactory: Send + Sync {
    fn create(&self, credential: &str) -> Arc<dyn NotificationTransport>;
}

impl<F> TransportFactory for F
where
    F: Fn(&str) -> Arc<dyn NotificationTransport> + Send + Sync,
{
    fn create(&self, credential: &str) -> Arc<dyn NotificationTransport> {
        self(credential)
    }
}

struct ActiveTransport {
    credential: String,
    transport: Arc<dyn NotificationTransport>,
}

/// Owns the live transport and restarts it when its credential changes.
pub struct TransportManager {
    factory: Box<dyn TransportFactory>,
    active: RwLock<Option<ActiveTransport>>,
}

impl TransportManager {
    /// Creates a manager with no active transport.
    pub fn new(factory: Box<dyn TransportFactory>) -> Self {
        Self {
            factory,
            active: RwLock::new(None),
        }
    }

    /// Applies a (possibly changed) credential.
    ///
    /// A blank credential stops the active transport with a warning. An
    /// unchanged credential with a ready transport is a no-op. Anything
    /// else shuts the old transport down and starts a fresh one.
    pub async fn apply_credential(&self, credential: &str) {
        let credential = credential.trim();
        let mut active = self.active.write().await;

        if credential.is_empty() {
            if let Some(old) = active.take() {
                old.transport.shutdown().await;
            }
            warn!("Notification credential is empty; transport will not start");
            return;
        }

        if let Some(current) = active.as_ref() {
            if current.credential == credential && current.transport.is_ready() {
                return;
            }
        }

        if let Some(old) = active.take() {
            old.transport.shutdown().await;
        }

        info!("Starting notification transport");
        *active = Some(ActiveTransport {
            credential: credential.to_string(),
            transport: self.factory.create(credential),
        });
    }

    /// Returns the active transport, if one is running.
    pub async fn active(&self) -> Option<Arc<dyn NotificationTransport>> {
        let active = self.active.read().await;
        active.as_ref().map(|a| Arc::clone(&a.transport))
    }

    /// Stops the active transport, if any.
    pub async fn shutdown(&self) {
        let mut active = self.active.write().await;
        if let Some(old) = active.take() {
            old.transport.shutdown().await;
        }
    }
}
