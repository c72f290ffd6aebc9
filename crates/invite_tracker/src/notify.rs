//! Notification supersession and dispatch.
//!
//! Sequences the side-effecting steps after a qualifying first-time join:
//! read the count, compute milestone state, delete the owner's previous
//! live notification, send the new one, and record its id. The steps are
//! sequential, not transactional; under transport failure there are brief
//! windows with zero or two visible notifications, which is accepted.
//! Counting correctness never depends on any of this succeeding.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::ledger::VisitLedger;
use crate::milestones::{milestone_index_at_or_below, milestone_just_reached};
use crate::registry::DomainMapping;
use crate::transport::{JoinNotice, TransportManager};

/// Orchestrates the delete-previous / send-new notification protocol.
pub struct NotificationCoordinator {
    ledger: Arc<VisitLedger>,
    transports: Arc<TransportManager>,
}

impl NotificationCoordinator {
    pub fn new(ledger: Arc<VisitLedger>, transports: Arc<TransportManager>) -> Self {
        Self { ledger, transports }
    }

    /// Announces a unique join that was just recorded in the ledger.
    ///
    /// If no transport is running or it is not ready, the whole exchange is
    /// skipped; the unique join stays recorded either way.
    pub async fn announce_unique_join(&self, mapping: &DomainMapping, player_name: &str) {
        let total = self
            .ledger
            .invite_count(&mapping.owner_id, &mapping.domain)
            .await;
        let just_reached = milestone_just_reached(total);
        let milestone_index = milestone_index_at_or_below(total);

        let transport = match self.transports.active().await {
            Some(t) if t.is_ready() => t,
            _ => {
                debug!(
                    "No ready transport; skipping notification for {} (count {})",
                    mapping.domain, total
                );
                return;
            }
        };

        // Supersession: at most one live notification per owner.
        if let Some(last_id) = self.ledger.last_message_id(&mapping.owner_id).await {
            transport.delete(&mapping.channel_id, &last_id).await;
        }

        let title = if just_reached > 0 {
            format!(
                "<@{}> has reached milestone {}",
                mapping.owner_id, just_reached
            )
        } else {
            format!("New invite via {}", mapping.domain)
        };

        let notice = JoinNotice {
            channel_id: mapping.channel_id.clone(),
            ping_content: format!("<@{}>", mapping.owner_id),
            title,
            player_name: player_name.to_string(),
            domain: mapping.domain.clone(),
            total_count: total,
            milestone_index,
            milestone_just_reached: just_reached,
        };

        match transport.send(&notice).await {
            Some(message_id) => {
                self.ledger
                    .set_last_message_id(&mapping.owner_id, message_id)
                    .await;
                self.ledger.save_async();
            }
            None => {
                warn!(
                    "Failed to send join notification for {} to channel {}",
                    mapping.domain, mapping.channel_id
                );
            }
        }
    }
}
