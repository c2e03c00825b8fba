//! Store events.
//!
//! Every mutating operation emits an event to all subscribers after it has
//! been persisted. Delivery is synchronous, best-effort and in-process
//! only: an event is pushed into each subscriber's channel before the
//! operation returns, and subscribers whose receiver was dropped are
//! removed.
//!
//! # Usage
//!
//! ```rust
//! use litekv_core::{SetArgs, Store, StoreConfig, StoreEvent};
//!
//! let mut store = Store::open_in_memory(StoreConfig::default()).unwrap();
//! let events = store.subscribe();
//!
//! store.set("main", SetArgs::new("a").value("x")).unwrap();
//!
//! let names: Vec<_> = events.try_iter().map(|e| e.name()).collect();
//! assert_eq!(names, ["ready", "new"]);
//! ```

use litekv_codec::Record;
use parking_lot::RwLock;
use std::sync::mpsc::{self, Receiver, Sender};

/// An event emitted by a store.
///
/// Records carried by events are plaintext.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    /// The store finished connecting.
    Ready {
        /// Configured tables, in order.
        tables: Vec<String>,
    },
    /// A record was written under a new key.
    New {
        /// Table name.
        table: String,
        /// The written record.
        record: Record,
    },
    /// A record replaced an existing one.
    Update {
        /// Table name.
        table: String,
        /// The replaced record.
        old: Record,
        /// The written record.
        new: Record,
    },
    /// A record was deleted.
    Remove {
        /// Table name.
        table: String,
        /// The deleted record.
        record: Record,
    },
    /// A table was emptied.
    Clear {
        /// Table name.
        table: String,
    },
    /// Records without a value were removed from a table.
    Clean {
        /// Table name.
        table: String,
    },
}

impl StoreEvent {
    /// Returns the event name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ready { .. } => "ready",
            Self::New { .. } => "new",
            Self::Update { .. } => "update",
            Self::Remove { .. } => "remove",
            Self::Clear { .. } => "clear",
            Self::Clean { .. } => "clean",
        }
    }

    /// Returns the table the event concerns, if any.
    #[must_use]
    pub fn table(&self) -> Option<&str> {
        match self {
            Self::Ready { .. } => None,
            Self::New { table, .. }
            | Self::Update { table, .. }
            | Self::Remove { table, .. }
            | Self::Clear { table }
            | Self::Clean { table } => Some(table),
        }
    }
}

/// Distributes store events to subscribers.
#[derive(Debug, Default)]
pub struct EventBus {
    subscribers: RwLock<Vec<Sender<StoreEvent>>>,
}

impl EventBus {
    /// Creates a bus with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes to all future events.
    ///
    /// Events queue up in the channel until received, so the receiver
    /// should be drained regularly.
    pub fn subscribe(&self) -> Receiver<StoreEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.write().push(tx);
        rx
    }

    /// Sends an event to every live subscriber.
    pub fn emit(&self, event: StoreEvent) {
        let mut subscribers = self.subscribers.write();
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Returns the number of subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }
}
