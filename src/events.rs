//! In-process fan-out of queue entry changes.
//!
//! Handlers publish after their transaction commits; dashboards subscribe with
//! a filter and receive the changed entry itself instead of re-querying.

use futures::{stream, Stream, StreamExt};
use serde::Serialize;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::entities::queue_entry;

const CHANNEL_CAPACITY: usize = 256;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Inserted,
    Updated,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Inserted => "inserted",
            ChangeKind::Updated => "updated",
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct QueueEvent {
    pub kind: ChangeKind,
    pub entry: queue_entry::Model,
}

/// Which changes a subscriber cares about.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventFilter {
    User(Uuid),
    Business(Uuid),
}

impl EventFilter {
    pub fn matches(&self, event: &QueueEvent) -> bool {
        match self {
            EventFilter::User(user_id) => event.entry.user_id == *user_id,
            EventFilter::Business(business_id) => event.entry.business_id == *business_id,
        }
    }
}

/// What a subscriber sees on its stream.
#[derive(Clone, Debug)]
pub enum Notification {
    Changed(QueueEvent),
    /// The subscriber fell behind and lost `missed` events; it should re-fetch.
    Resync { missed: u64 },
}

#[derive(Clone)]
pub struct QueueHub {
    tx: broadcast::Sender<QueueEvent>,
    shutdown: CancellationToken,
}

impl Default for QueueHub {
    fn default() -> Self {
        Self::new()
    }
}

impl QueueHub {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            tx,
            shutdown: CancellationToken::new(),
        }
    }

    /// Ends every open stream, including ones opened afterwards.
    pub fn close(&self) {
        self.shutdown.cancel();
    }

    pub fn publish(&self, kind: ChangeKind, entry: queue_entry::Model) {
        // No subscribers is not an error
        let receivers = self.tx.send(QueueEvent { kind, entry }).unwrap_or(0);
        tracing::debug!(kind = kind.as_str(), receivers, "Published queue event");
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Stream of the changes matching `filter`. Ends when the hub is closed or
    /// dropped.
    pub fn watch(&self, filter: EventFilter) -> impl Stream<Item = Notification> + Send + 'static {
        let rx = self.tx.subscribe();
        let shutdown = self.shutdown.clone();
        stream::unfold((rx, filter), |(mut rx, filter)| async move {
            loop {
                match rx.recv().await {
                    Ok(event) if filter.matches(&event) => {
                        return Some((Notification::Changed(event), (rx, filter)));
                    }
                    Ok(_) => continue,
                    Err(RecvError::Lagged(missed)) => {
                        tracing::warn!(missed, "Queue event subscriber lagged");
                        return Some((Notification::Resync { missed }, (rx, filter)));
                    }
                    Err(RecvError::Closed) => return None,
                }
            }
        })
        .take_until(async move { shutdown.cancelled().await })
    }
}
