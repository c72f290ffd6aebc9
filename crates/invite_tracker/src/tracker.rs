//! Top-level join pipeline and administrative operations.
//!
//! Wires the registry, ledger, milestone arithmetic, and notification
//! coordinator together: join event in, attributed unique-join count and
//! superseding notification out. Also carries the authorized reload
//! operation and the shutdown sequence.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::error::{TrackerError, TrackerResult};
use crate::events::{AdminActor, JoinAttempt};
use crate::ledger::VisitLedger;
use crate::notify::NotificationCoordinator;
use crate::registry::DomainRegistry;
use crate::schema::DomainEntry;
use crate::transport::{TransportFactory, TransportManager};

/// Capability an actor must hold to run [`InviteTracker::reload`].
pub const RELOAD_CAPABILITY: &str = "tracker.reload";

/// The domain-attribution and milestone-notification pipeline.
pub struct InviteTracker {
    registry: Arc<DomainRegistry>,
    ledger: Arc<VisitLedger>,
    transports: Arc<TransportManager>,
    coordinator: NotificationCoordinator,
}

impl InviteTracker {
    /// Assembles the pipeline around an opened ledger and a transport
    /// factory. No domains are mapped and no transport is running until
    /// the first [`reload`](Self::reload) (or direct registry/credential
    /// setup by the host).
    pub fn new(ledger: VisitLedger, factory: Box<dyn TransportFactory>) -> Self {
        let registry = Arc::new(DomainRegistry::new());
        let ledger = Arc::new(ledger);
        let transports = Arc::new(TransportManager::new(factory));
        let coordinator =
            NotificationCoordinator::new(Arc::clone(&ledger), Arc::clone(&transports));

        Self {
            registry,
            ledger,
            transports,
            coordinator,
        }
    }

    /// Handles one join event delivered by the host.
    ///
    /// Unmapped or blank hostnames return without touching the ledger.
    /// Repeat joins by a known identity are recorded nowhere and notify
    /// no one; only a first-time identity for the owner/domain pair moves
    /// the count and triggers the notification exchange.
    pub async fn handle_join(&self, event: JoinAttempt) {
        if event.hostname.trim().is_empty() {
            return;
        }

        let Some(mapping) = self.registry.resolve(&event.hostname) else {
            debug!("No mapping for hostname '{}'", event.hostname);
            return;
        };

        let first_time = self
            .ledger
            .mark_unique_if_first(&mapping.owner_id, &mapping.domain, event.player_id)
            .await;
        if !first_time {
            return;
        }

        debug!(
            "Unique join: {} ({}) via {}",
            event.player_name, event.player_id, mapping.domain
        );
        self.coordinator
            .announce_unique_join(&mapping, &event.player_name)
            .await;
    }

    /// Re-applies configuration: rebuilds the domain registry, restarts
    /// the transport if its credential changed, and forces a synchronous
    /// ledger flush.
    ///
    /// Requires the [`RELOAD_CAPABILITY`]; idempotent for unchanged input.
    /// Returns the elapsed time.
    pub async fn reload(
        &self,
        actor: &AdminActor,
        entries: &[DomainEntry],
        credential: &str,
    ) -> TrackerResult<Duration> {
        if !actor.can(RELOAD_CAPABILITY) {
            return Err(TrackerError::Unauthorized {
                actor: actor.name.clone(),
                capability: RELOAD_CAPABILITY.to_string(),
            });
        }

        let start = Instant::now();
        let loaded = self.registry.rebuild(entries);
        self.transports.apply_credential(credential).await;
        self.ledger.save().await?;

        let took = start.elapsed();
        info!(
            "Reload by '{}': {} mappings in {}ms",
            actor.name,
            loaded,
            took.as_millis()
        );
        Ok(took)
    }

    /// Stops the transport and flushes the ledger one final time.
    pub async fn shutdown(&self) -> TrackerResult<()> {
        self.transports.shutdown().await;
        self.ledger.save().await?;
        info!("Invite tracker shut down");
        Ok(())
    }

    /// The live domain registry.
    pub fn registry(&self) -> &Arc<DomainRegistry> {
        &self.registry
    }

    /// The visit ledger.
    pub fn ledger(&self) -> &Arc<VisitLedger> {
        &self.ledger
    }

    /// The transport manager.
    pub fn transports(&self) -> &Arc<TransportManager> {
        &self.transports
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::PlayerId;
    use crate::test_support::RecordingTransport;
    use crate::transport::NotificationTransport;
    use tempfile::TempDir;

    fn entry(path: &str, channel: &str, owner: &str) -> DomainEntry {
        DomainEntry {
            path: path.to_string(),
            channel_id: channel.to_string(),
            owner_id: owner.to_string(),
        }
    }

    fn admin() -> AdminActor {
        AdminActor::new("console", vec![RELOAD_CAPABILITY.to_string()])
    }

    async fn tracker_with(
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
        tracker
            .reload(
                &admin(),
                &[entry("danasty.example.com", "C1", "U1")],
                "token",
            )
            .await
            .unwrap();
        (dir, tracker)
    }

    fn join(hostname: &str, name: &str) -> JoinAttempt {
        JoinAttempt {
            hostname: hostname.to_string(),
            player_id: PlayerId::new(),
            player_name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn test_unknown_hostname_causes_no_mutation_and_no_notification() {
        let transport = Arc::new(RecordingTransport::ready());
        let (_dir, tracker) = tracker_with(Arc::clone(&transport)).await;

        tracker.handle_join(join("unknown.example.com", "Steve")).await;
        tracker.handle_join(join("", "Steve")).await;

        assert_eq!(
            tracker.ledger().invite_count("U1", "danasty.example.com").await,
            0
        );
        assert!(transport.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_repeat_join_notifies_only_once() {
        let transport = Arc::new(RecordingTransport::ready());
        let (_dir, tracker) = tracker_with(Arc::clone(&transport)).await;

        let event = join("danasty.example.com", "Steve");
        tracker.handle_join(event.clone()).await;
        tracker.handle_join(event).await;

        assert_eq!(
            tracker.ledger().invite_count("U1", "danasty.example.com").await,
            1
        );
        assert_eq!(transport.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unauthorized_reload_is_rejected() {
        let transport = Arc::new(RecordingTransport::ready());
        let (_dir, tracker) = tracker_with(Arc::clone(&transport)).await;

        let result = tracker
            .reload(
                &AdminActor::unprivileged("guest"),
                &[],
                "token",
            )
            .await;

        assert!(matches!(result, Err(TrackerError::Unauthorized { .. })));
        // The registry still holds the original mapping.
        assert!(tracker.registry().resolve("danasty.example.com").is_some());
    }

    #[tokio::test]
    async fn test_reload_removes_dropped_domains_and_flushes() {
        let transport = Arc::new(RecordingTransport::ready());
        let (dir, tracker) = tracker_with(Arc::clone(&transport)).await;

        tracker.handle_join(join("danasty.example.com", "Steve")).await;
        let took = tracker
            .reload(
                &admin(),
                &[entry("other.example.com", "C2", "U2")],
                "token",
            )
            .await
            .unwrap();
        assert!(took.as_secs() < 10);

        assert!(tracker.registry().resolve("danasty.example.com").is_none());
        assert!(tracker.registry().resolve("other.example.com").is_some());

        // The flush was synchronous; a fresh ledger sees the join.
        let reopened = VisitLedger::open(dir.path().join("invites.json"))
            .await
            .unwrap();
        assert_eq!(reopened.invite_count("U1", "danasty.example.com").await, 1);
    }

    #[tokio::test]
    async fn test_shutdown_flushes_ledger() {
        let transport = Arc::new(RecordingTransport::ready());
        let (dir, tracker) = tracker_with(Arc::clone(&transport)).await;

        tracker.handle_join(join("danasty.example.com", "Steve")).await;
        tracker.shutdown().await.unwrap();

        let reopened = VisitLedger::open(dir.path().join("invites.json"))
            .await
            .unwrap();
        assert_eq!(reopened.invite_count("U1", "danasty.example.com").await, 1);
    }
}
