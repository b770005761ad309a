//! Centralized default constants for the quire note-sync engine.
//!
//! **This module is the single source of truth** for all shared default
//! values. Other crates reference these constants instead of defining their
//! own magic numbers.

// =============================================================================
// FOLDERS
// =============================================================================

/// Name of the distinguished, protected per-user folder. Created lazily on
/// first use; never renamed or deleted.
pub const DEFAULT_FOLDER_NAME: &str = "Default";

// =============================================================================
// CHANNELS
// =============================================================================

/// Buffer capacity for the transient status-message broadcast channel.
///
/// Recommended: 32 for production, 8 for tests. Messages are fire-and-once;
/// a slow subscriber that lags simply misses old messages.
pub const MESSAGE_CAPACITY: usize = 32;

// =============================================================================
// STORE
// =============================================================================

/// Maximum folder/note name and title length accepted before a remote call
/// is attempted.
pub const NAME_MAX_LEN: usize = 256;
