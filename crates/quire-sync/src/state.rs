//! Observable published state.
//!
//! Every value the synchronization core publishes is a [`Published`]: a
//! last-known snapshot plus a set of subscribers, replaced wholesale on
//! every change so readers never observe a torn value. Transient status
//! messages use a broadcast channel instead — a message is delivered once
//! to the subscribers present at publication time and is never replayed,
//! which is exactly the show-once-then-clear contract the presentation
//! layer needs.

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, watch};
use tracing::debug;

use quire_core::{Folder, Note};

// =============================================================================
// PUBLISHED VALUES
// =============================================================================

/// A single-writer observable value.
///
/// Writers replace the value wholesale with [`set`](Published::set);
/// readers either take a snapshot with [`get`](Published::get) or subscribe
/// for changes. Dropping every receiver does not disable the value; new
/// subscribers always observe the last-known snapshot.
pub struct Published<T> {
    tx: watch::Sender<T>,
}

impl<T: Clone + Send + Sync + 'static> Published<T> {
    /// Create a published value with an initial snapshot.
    pub fn new(initial: T) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx }
    }

    /// Snapshot of the current value.
    pub fn get(&self) -> T {
        self.tx.borrow().clone()
    }

    /// Replace the value and notify subscribers.
    pub fn set(&self, value: T) {
        self.tx.send_replace(value);
    }

    /// Subscribe to changes. The receiver's current value is the
    /// last-known snapshot.
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.tx.subscribe()
    }

    /// Number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

// =============================================================================
// STATUS MESSAGES
// =============================================================================

/// Outcome class of a completed or rejected operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageKind {
    /// Mutating operation completed against the remote store.
    Success,
    /// Remote store reported a failure; state is unchanged unless noted.
    Failure,
    /// Rejected locally (validation or guard) — no remote call was made.
    Rejected,
}

/// One transient, user-visible message per operation outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusMessage {
    pub kind: MessageKind,
    pub text: String,
}

impl StatusMessage {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Success,
            text: text.into(),
        }
    }

    pub fn failure(text: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Failure,
            text: text.into(),
        }
    }

    pub fn rejected(text: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Rejected,
            text: text.into(),
        }
    }
}

// =============================================================================
// SESSION STATE
// =============================================================================

/// All state a session publishes to the presentation layer.
pub struct SessionState {
    /// Folders owned by the user, excluding the Default folder.
    pub folders: Published<Vec<Folder>>,
    /// Notes of the current notes scope (selected folder or all-notes view).
    pub notes: Published<Vec<Note>>,
    /// The folder whose notes are shown.
    pub selected_folder: Published<Option<Folder>>,
    /// The note open for editing, if any.
    pub selected_note: Published<Option<Note>>,
    /// The user's protected Default folder, once resolved.
    pub default_folder: Published<Option<Folder>>,
    /// True while a notes fetch for the current scope is in flight.
    pub loading: Published<bool>,
    messages: broadcast::Sender<StatusMessage>,
}

impl SessionState {
    pub(crate) fn new(message_capacity: usize) -> Self {
        let (messages, _) = broadcast::channel(message_capacity);
        Self {
            folders: Published::new(Vec::new()),
            notes: Published::new(Vec::new()),
            selected_folder: Published::new(None),
            selected_note: Published::new(None),
            default_folder: Published::new(None),
            loading: Published::new(false),
            messages,
        }
    }

    /// Subscribe to transient status messages. Each subscriber receives
    /// messages published after it subscribed; nothing is replayed.
    pub fn subscribe_messages(&self) -> broadcast::Receiver<StatusMessage> {
        self.messages.subscribe()
    }

    /// Publish one transient message. Silently dropped with no subscribers.
    pub(crate) fn post(&self, message: StatusMessage) {
        debug!(
            subsystem = "sync",
            component = "state",
            op = "post_message",
            kind = ?message.kind,
            text = %message.text,
            "Status message"
        );
        let _ = self.messages.send(message);
    }
}
