//! Core identity and event types for the invite tracker.
//!
//! These are the types the host hands to the tracker. Wrapper types keep
//! player identities from being confused with the string ids used for
//! owners, channels, and messages.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a connecting player.
///
/// A wrapper around UUID that provides type safety and ensures player
/// identities cannot be confused with other ids in the system. The host
/// assigns these; the tracker only compares and stores them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub Uuid);

impl PlayerId {
    /// Creates a new random player ID using UUID v4.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parses a player ID from a string representation.
    ///
    /// # Arguments
    ///
    /// * `s` - A string slice containing a valid UUID
    pub fn from_str(s: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(s).map(Self)
    }
}

impl Default for PlayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A join event delivered by the host after it has already decided to
/// allow the connection.
///
/// The tracker never accepts or rejects connections itself; it only
/// attributes the join to the domain the player connected through.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinAttempt {
    /// Raw virtual-host string the client used to connect, possibly
    /// carrying a `:port` suffix and arbitrary casing
    pub hostname: String,
    /// Identity of the connecting player
    pub player_id: PlayerId,
    /// Display name used in notification content
    pub player_name: String,
}

/// An actor requesting an administrative operation.
///
/// Authorization is a flat capability set; the host decides how actors
/// acquire capabilities.
#[derive(Debug, Clone)]
pub struct AdminActor {
    /// Human-readable actor name, used in audit logging
    pub name: String,
    capabilities: Vec<String>,
}

impl AdminActor {
    /// Creates an actor holding the given capabilities.
    pub fn new(name: impl Into<String>, capabilities: Vec<String>) -> Self {
        Self {
            name: name.into(),
            capabilities,
        }
    }

    /// Creates an actor with no capabilities.
    pub fn unprivileged(name: impl Into<String>) -> Self {
        Self::new(name, Vec::new())
    }

    /// Returns true if the actor holds the named capability.
    pub fn can(&self, capability: &str) -> bool {
        self.capabilities.iter().any(|c| c == capability)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_id_round_trip() {
        let id = PlayerId::new();
        let parsed = PlayerId::from_str(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_player_id_rejects_garbage() {
        assert!(PlayerId::from_str("not-a-uuid").is_err());
    }

    #[test]
    fn test_join_attempt_serialization() {
        let event = JoinAttempt {
            hostname: "play.example.com:25565".to_string(),
            player_id: PlayerId::new(),
            player_name: "Steve".to_string(),
        };

        let json = serde_json::to_string(&event).unwrap();
        let back: JoinAttempt = serde_json::from_str(&json).unwrap();
        assert_eq!(back.hostname, event.hostname);
        assert_eq!(back.player_id, event.player_id);
        assert_eq!(back.player_name, "Steve");
    }

    #[test]
    fn test_admin_actor_capabilities() {
        let actor = AdminActor::new("console", vec!["tracker.reload".to_string()]);
        assert!(actor.can("tracker.reload"));
        assert!(!actor.can("tracker.wipe"));

        let nobody = AdminActor::unprivileged("guest");
        assert!(!nobody.can("tracker.reload"));
    }
}
