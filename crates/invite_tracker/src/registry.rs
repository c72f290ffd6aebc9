//! Domain-to-owner resolution with atomically replaceable snapshots.
//!
//! The registry maps the normalized virtual-host string a client connected
//! through to the owner and channel configured for it. Rebuilds construct a
//! complete new lookup table and publish it in one atomic store, so a
//! lookup in progress sees either the fully-old or fully-new table, never a
//! partial one. The resolve path takes no locks.

use arc_swap::ArcSwap;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::ConfigError;
use crate::schema::DomainEntry;

/// An immutable mapping from one domain to its owner and channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainMapping {
    /// Normalized (trimmed, lowercase) fully-qualified domain
    pub domain: String,
    /// Channel the owner's notifications are posted to
    pub channel_id: String,
    /// Identity that owns this domain
    pub owner_id: String,
}

type MappingTable = HashMap<String, Arc<DomainMapping>>;

/// Exact-match domain lookup table behind an atomically swappable snapshot.
pub struct DomainRegistry {
    table: ArcSwap<MappingTable>,
}

impl DomainRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            table: ArcSwap::from_pointee(MappingTable::new()),
        }
    }

    /// Rebuilds the lookup table from configuration entries and publishes
    /// it atomically.
    ///
    /// Each entry's domain is trimmed and lowercased; entries with an empty
    /// domain, channel id, or owner id after trimming are skipped with a
    /// warning rather than failing the whole rebuild. Safe to call
    /// repeatedly with unchanged input.
    ///
    /// Returns the number of mappings loaded.
    pub fn rebuild(&self, entries: &[DomainEntry]) -> usize {
        let mut table = MappingTable::new();

        for entry in entries {
            let mapping = match Self::validate_entry(entry) {
                Ok(mapping) => mapping,
                Err(e) => {
                    warn!("Skipping domain mapping: {}", e);
                    continue;
                }
            };
            table.insert(mapping.domain.clone(), Arc::new(mapping));
        }

        let loaded = table.len();
        if loaded > 0 {
            let summary: Vec<String> = table
                .values()
                .map(|m| format!("{} -> owner {} / channel {}", m.domain, m.owner_id, m.channel_id))
                .collect();
            info!("Loaded {} domain mappings: {}", loaded, summary.join(", "));
        } else {
            warn!("No valid domain mappings loaded");
        }

        self.table.store(Arc::new(table));
        loaded
    }

    /// Resolves a raw hostname to its mapping, if one is configured.
    ///
    /// Strips a trailing `:port` suffix, trims, and lowercases before the
    /// exact lookup. No wildcard or suffix matching.
    pub fn resolve(&self, hostname: &str) -> Option<Arc<DomainMapping>> {
        let normalized = normalize_hostname(hostname);
        if normalized.is_empty() {
            return None;
        }
        self.table.load().get(&normalized).cloned()
    }

    /// Returns the mappings in the current snapshot.
    pub fn mappings(&self) -> Vec<Arc<DomainMapping>> {
        self.table.load().values().cloned().collect()
    }

    fn validate_entry(entry: &DomainEntry) -> Result<DomainMapping, ConfigError> {
        let domain = entry.path.trim().to_lowercase();
        if domain.is_empty() {
            return Err(ConfigError::EmptyDomain);
        }

        let channel_id = entry.channel_id.trim();
        if channel_id.is_empty() {
            return Err(ConfigError::EmptyChannelId(domain));
        }

        let owner_id = entry.owner_id.trim();
        if owner_id.is_empty() {
            return Err(ConfigError::EmptyOwnerId(domain));
        }

        Ok(DomainMapping {
            domain,
            channel_id: channel_id.to_string(),
            owner_id: owner_id.to_string(),
        })
    }
}

impl Default for DomainRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Normalizes a raw hostname for lookup: port suffix stripped, trimmed,
/// lowercased.
fn normalize_hostname(raw: &str) -> String {
    let without_port = match raw.find(':') {
        Some(colon) => &raw[..colon],
        None => raw,
    };
    without_port.trim().to_lowercase()
}
