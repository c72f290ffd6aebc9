//! Hierarchical domain-configuration traversal.
//!
//! Domain mappings live in a nested TOML table where each dotted path
//! segment is its own table, e.g. `[domains.play.example.com]`. A node is a
//! mapping leaf once it carries both a `channel_id` and an `owner_id`,
//! regardless of nesting depth; the leaf's domain is the dotted path of its
//! ancestor keys.
//!
//! The walk is pure: it produces a flat list of raw entries and never
//! touches the live registry. Validation of the collected values happens
//! during [`crate::registry::DomainRegistry::rebuild`].

use toml::{Table, Value};

/// A raw domain mapping collected from configuration.
///
/// Values are passed through untrimmed and unvalidated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainEntry {
    /// Full dotted domain path reconstructed from ancestor keys
    pub path: String,
    /// Channel the owner's notifications are posted to
    pub channel_id: String,
    /// Identity that owns the domain and receives notifications
    pub owner_id: String,
}

// A node carrying both of these keys is a mapping leaf.
const CHANNEL_KEY: &str = "channel_id";
const OWNER_KEY: &str = "owner_id";

/// Walks a nested domain table and collects every mapping leaf exactly once.
///
/// A node carrying both `channel_id` and `owner_id` is a leaf; its children
/// are not descended into. All other nodes are containers whose child
/// tables are walked with the child's key appended to the path.
pub fn collect_domain_leaves(root: &Table) -> Vec<DomainEntry> {
    let mut out = Vec::new();
    walk(root, String::new(), &mut out);
    out
}

fn walk(node: &Table, prefix: String, out: &mut Vec<DomainEntry>) {
    if let (Some(channel), Some(owner)) = (node.get(CHANNEL_KEY), node.get(OWNER_KEY)) {
        out.push(DomainEntry {
            path: prefix,
            channel_id: value_as_string(channel),
            owner_id: value_as_string(owner),
        });
        return;
    }

    for (key, value) in node {
        if let Value::Table(child) = value {
            let child_prefix = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{prefix}.{key}")
            };
            walk(child, child_prefix, out);
        }
    }
}

/// Stringifies a leaf value. Channel and owner ids are snowflake-style
/// numbers that users write either quoted or bare, so integers are
/// accepted alongside strings.
fn value_as_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Integer(i) => i.to_string(),
        other => other.to_string(),
    }
}
