//! Line-delimited JSON join-event feed.
//!
//! The host event system is a collaborator outside this repository; the
//! daemon accepts its `JoinAttempt` events as one JSON object per line on
//! stdin. Each event is dispatched on its own task so a slow notification
//! exchange never blocks the feed. Malformed lines are skipped with a
//! warning.

use invite_tracker::{InviteTracker, JoinAttempt};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{info, warn};

/// Parses one feed line into a join event.
///
/// Blank lines are silently skipped; malformed JSON is logged and skipped.
pub fn parse_join_line(line: &str) -> Option<JoinAttempt> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match serde_json::from_str(line) {
        Ok(event) => Some(event),
        Err(e) => {
            warn!("Ignoring malformed join event: {}", e);
            None
        }
    }
}

/// Reads join events from stdin until it closes.
pub async fn run_join_feed(tracker: Arc<InviteTracker>) {
    info!("Join feed listening on stdin (one JSON event per line)");
    drain_feed(BufReader::new(tokio::io::stdin()), tracker).await;
}

/// Dispatches join events from `reader` until EOF or a read error.
///
/// A read error ends the feed like EOF does, but is logged so it is
/// distinguishable from the feed closing cleanly.
async fn drain_feed<R: AsyncBufRead + Unpin>(reader: R, tracker: Arc<InviteTracker>) {
    let mut lines = reader.lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if let Some(event) = parse_join_line(&line) {
                    let tracker = Arc::clone(&tracker);
                    tokio::spawn(async move {
                        tracker.handle_join(event).await;
                    });
                }
            }
            Ok(None) => break,
            Err(e) => {
                warn!("Join feed read error, stopping feed: {}", e);
                break;
            }
        }
    }
    info!("Join feed closed");
}
