//! Polling change feed.
//!
//! Backends without a push channel emulate one: a thread re-selects the
//! watched rows on an interval and diffs the result against the previous
//! snapshot by row id and content hash.

use std::collections::HashMap;
use std::sync::mpsc;
use std::time::Duration;

use tracing::{debug, warn};

use super::hash::{content_hash, has_changed};
use super::{value_text, ChangeEvent, ChangeKind, Row, Subscription};
use crate::error::Result;

/// Rows last seen, keyed by id: (content hash, row).
pub type Snapshot = HashMap<String, (String, Row)>;

fn row_key(row: &Row) -> String {
    row.get("id").map_or_else(|| content_hash(row), value_text)
}

/// Build a snapshot from a full result set.
#[must_use]
pub fn snapshot(rows: Vec<Row>) -> Snapshot {
    rows.into_iter()
        .map(|row| (row_key(&row), (content_hash(&row), row)))
        .collect()
}

/// Compare a fresh result set against the previous snapshot.
///
/// Returns the change events (inserts and updates in result order, then
/// deletes in key order) and the new snapshot.
#[must_use]
pub fn diff(table: &str, previous: &Snapshot, rows: Vec<Row>) -> (Vec<ChangeEvent>, Snapshot) {
    let mut events = Vec::new();
    let mut next = Snapshot::with_capacity(rows.len());

    for row in rows {
        let key = row_key(&row);
        let hash = content_hash(&row);
        match previous.get(&key) {
            None => events.push(ChangeEvent {
                table: table.to_string(),
                kind: ChangeKind::Insert,
                new: Some(row.clone()),
                old: None,
            }),
            Some((old_hash, old)) if has_changed(&hash, Some(old_hash)) => {
                events.push(ChangeEvent {
                    table: table.to_string(),
                    kind: ChangeKind::Update,
                    new: Some(row.clone()),
                    old: Some(old.clone()),
                });
            }
            Some(_) => {}
        }
        next.insert(key, (hash, row));
    }

    let mut removed: Vec<_> = previous.keys().filter(|k| !next.contains_key(*k)).collect();
    removed.sort();
    for key in removed {
        let (_, old) = &previous[key];
        events.push(ChangeEvent {
            table: table.to_string(),
            kind: ChangeKind::Delete,
            new: None,
            old: Some(old.clone()),
        });
    }

    (events, next)
}

/// Start a polling feed.
///
/// `initial` is the snapshot the feed starts from; `fetch` re-selects the
/// watched rows. Fetch errors are logged and the next tick tries again.
/// The thread exits once the returned subscription is dropped.
pub fn spawn<F>(table: &str, interval: Duration, initial: Snapshot, fetch: F) -> Subscription
where
    F: Fn() -> Result<Vec<Row>> + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    let thread_table = table.to_string();

    std::thread::spawn(move || {
        let mut current = initial;
        loop {
            std::thread::sleep(interval);

            let rows = match fetch() {
                Ok(rows) => rows,
                Err(e) => {
                    warn!(table = %thread_table, error = %e, "Change feed poll failed");
                    continue;
                }
            };

            let (events, next) = diff(&thread_table, &current, rows);
            current = next;
            if !events.is_empty() {
                debug!(table = %thread_table, events = events.len(), "Change feed delivered events");
            }
            for event in events {
                if tx.send(event).is_err() {
                    return;
                }
            }
        }
    });

    Subscription::new(table, rx)
}
