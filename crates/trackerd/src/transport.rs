//! Tracing-backed notification transport.
//!
//! The real chat backend is a collaborator outside this repository. This
//! transport keeps the daemon runnable without one: every notice is
//! emitted through the logging system and assigned a sequential message
//! id so the supersession protocol still exercises end to end.

use async_trait::async_trait;
use invite_tracker::{JoinNotice, NotificationTransport};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

pub struct LoggingTransport {
    next_id: AtomicU64,
}

impl LoggingTransport {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
        }
    }
}

impl Default for LoggingTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotificationTransport for LoggingTransport {
    fn is_ready(&self) -> bool {
        true
    }

    async fn send(&self, notice: &JoinNotice) -> Option<String> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let message_id = format!("local-{id}");
        info!(
            "[{}] {} | player={} domain={} total={} milestone={}",
            notice.channel_id,
            notice.title,
            notice.player_name,
            notice.domain,
            notice.total_count,
            notice.milestone_index
        );
        Some(message_id)
    }

    async fn delete(&self, channel_id: &str, message_id: &str) {
        debug!("[{}] superseding message {}", channel_id, message_id);
    }
}
