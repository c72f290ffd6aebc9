//! # Invite Tracker - Domain Attribution & Milestone Notifications
//!
//! A library that attributes server-join events to the virtual-host domain
//! a player connected through, maps that domain to an owning identity,
//! deduplicates repeat joins per player, counts unique joins per
//! owner/domain pair, computes milestone thresholds, and emits a
//! superseding outbound notification when a new unique join occurs.
//!
//! ## Design Philosophy
//!
//! The tracker contains **no host logic**: the game-server event
//! subscription, the chat backend, and connection accept/reject decisions
//! all live outside this crate. The host hands in [`JoinAttempt`] events
//! and a [`NotificationTransport`] implementation; everything between
//! those two seams is this crate's job.
//!
//! ## Architecture Overview
//!
//! * **Domain Registry** ([`registry`]) - exact-match hostname lookup
//!   behind an atomically swappable snapshot; rebuilt from configuration
//!   at any time without blocking readers.
//! * **Visit Ledger** ([`ledger`]) - durable, idempotent record of which
//!   identities already joined per owner/domain pair; the single source
//!   of truth for counts and last-notification ids.
//! * **Milestone Calculator** ([`milestones`]) - pure threshold
//!   arithmetic over the cumulative unique-join count.
//! * **Notification Coordinator** ([`notify`]) - the delete-previous /
//!   send-new supersession protocol, keeping at most one live
//!   notification per owner.
//! * **Schema walk** ([`schema`]) - pure traversal of the hierarchical
//!   domain configuration into flat mapping entries.
//! * **Orchestrator** ([`tracker`]) - the join pipeline plus the
//!   authorized reload and shutdown sequences.
//!
//! ## Pipeline
//!
//! 1. Host delivers a [`JoinAttempt`] (once per allowed connection)
//! 2. [`DomainRegistry::resolve`] attributes it to a mapping, or drops it
//! 3. [`VisitLedger::mark_unique_if_first`] dedupes per identity
//! 4. First-timers flow through milestone computation into
//!    [`NotificationCoordinator::announce_unique_join`]
//! 5. The new message id is recorded and an asynchronous flush scheduled
//!
//! ## Error Handling
//!
//! Nothing in this pipeline aborts the host: bad configuration leaves are
//! skipped with a warning, transport failures are logged and never
//! retried, and flush failures leave in-memory state authoritative until
//! the next successful flush. Idempotence of the unique-join count is the
//! one property the ledger guarantees unconditionally.

pub use error::{ConfigError, StorageError, StorageResult, TrackerError, TrackerResult};
pub use events::{AdminActor, JoinAttempt, PlayerId};
pub use ledger::VisitLedger;
pub use milestones::{milestone_index_at_or_below, milestone_just_reached, MILESTONE_SCHEDULE};
pub use notify::NotificationCoordinator;
pub use registry::{DomainMapping, DomainRegistry};
pub use schema::{collect_domain_leaves, DomainEntry};
pub use tracker::{InviteTracker, RELOAD_CAPABILITY};
pub use transport::{JoinNotice, NotificationTransport, TransportFactory, TransportManager};

pub mod error;
pub mod events;
pub mod ledger;
pub mod milestones;
pub mod notify;
pub mod registry;
pub mod schema;
pub mod tracker;
pub mod transport;


#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::RecordingTransport;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn entries() -> Vec<DomainEntry> {
        collect_domain_leaves(
            &toml::from_str(
                r#"
                [danasty.example.com]
                channel_id = "C1"
                owner_id = "U1"
                "#,
            )
            .unwrap(),
        )
    }

    async fn full_tracker(
        transport: Arc<RecordingTransport>,
    ) -> (TempDir, InviteTracker) {
        let dir = TempDir::new().unwrap();
        let ledger = VisitLedger::open(dir.path().join("invites.json"))
            .await
            .unwrap();
        let factory = move |_credential: &str| -> Arc<dyn NotificationTransport> {
            Arc::clone(&transport) as Arc<dyn NotificationTransport>
        };
        let tracker = InviteTracker::new(ledger, Box::new(factory));
        let admin = AdminActor::new("console", vec![RELOAD_CAPABILITY.to_string()]);
        tracker.reload(&admin, &entries(), "token").await.unwrap();
        (dir, tracker)
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_end_to_end_third_join_reaches_first_milestone() {
        let transport = Arc::new(RecordingTransport::ready());
        let (_dir, tracker) = full_tracker(Arc::clone(&transport)).await;

        // Two prior unique joins put the count at 2.
        for name in ["Alex", "Robin"] {
            tracker
                .handle_join(JoinAttempt {
                    hostname: "danasty.example.com".to_string(),
                    player_id: PlayerId::new(),
                    player_name: name.to_string(),
                })
                .await;
        }
        let id_before = tracker.ledger().last_message_id("U1").await.unwrap();

        // The third join lands exactly on milestone 1.
        tracker
            .handle_join(JoinAttempt {
                hostname: "Danasty.Example.COM:25565".to_string(),
                player_id: PlayerId::new(),
                player_name: "Steve".to_string(),
            })
            .await;

        assert_eq!(
            tracker.ledger().invite_count("U1", "danasty.example.com").await,
            3
        );

        let sent = transport.sent.lock().unwrap();
        let last = sent.last().unwrap();
        assert_eq!(last.title, "<@U1> has reached milestone 1");
        assert_eq!(last.total_count, 3);
        assert_eq!(last.milestone_just_reached, 1);
        assert_eq!(last.player_name, "Steve");
        assert_eq!(last.domain, "danasty.example.com");

        // The second message was superseded before the third was sent.
        let deleted = transport.deleted.lock().unwrap();
        assert_eq!(deleted.last().unwrap().1, id_before);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_concurrent_joins_count_exactly_once_each() {
        let transport = Arc::new(RecordingTransport::ready());
        let (_dir, tracker) = full_tracker(Arc::clone(&transport)).await;
        let tracker = Arc::new(tracker);

        let ids: Vec<PlayerId> = (0..40).map(|_| PlayerId::new()).collect();
        let tasks: Vec<_> = ids
            .iter()
            .flat_map(|&player_id| {
                // Each identity joins twice, concurrently.
                (0..2).map(move |_| player_id)
            })
            .map(|player_id| {
                let tracker = Arc::clone(&tracker);
                tokio::spawn(async move {
                    tracker
                        .handle_join(JoinAttempt {
                            hostname: "danasty.example.com".to_string(),
                            player_id,
                            player_name: "anyone".to_string(),
                        })
                        .await;
                })
            })
            .collect();

        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(
            tracker.ledger().invite_count("U1", "danasty.example.com").await,
            40
        );
        assert_eq!(transport.sent.lock().unwrap().len(), 40);
    }
}
