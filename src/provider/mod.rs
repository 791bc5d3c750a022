pub mod awscli;
pub mod memory;

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// A snapshot as observed in the account inventory.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub id: String,
    /// Volume the snapshot was taken from. Absent for orphaned snapshots;
    /// an empty string is treated the same as absent.
    pub volume_id: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
}

/// Volume-to-instance attachment record.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub instance_id: String,
}

/// Result of looking up a snapshot's volume.
///
/// "Not found" is a valid classification input, not an error, so it is a
/// variant here rather than an `Err`. This keeps the classifier's branching
/// exhaustive without it ever inspecting provider error codes.
#[derive(Debug, Clone)]
pub enum VolumeLookup {
    /// Volume exists; attachments may be empty (detached).
    Found(Vec<Attachment>),
    /// Volume is gone from the inventory (deleted or never existed).
    NotFound,
    /// Lookup failed for some other reason (throttling, permissions, network).
    TransientError(String),
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider call failed: {0}")]
    Command(String),

    #[error("failed to parse provider response: {0}")]
    Parse(String),
}

/// The block-storage inventory the reaper runs against.
///
/// Injected into the classifier so tests can substitute an in-memory double
/// with no network access.
pub trait Provider {
    /// All snapshots owned by the calling account.
    fn list_snapshots(&self) -> Result<Vec<Snapshot>, ProviderError>;

    /// Ids of instances in a live state (running or stopped), flattened to
    /// a set regardless of how the provider nests them.
    fn list_live_instance_ids(&self) -> Result<HashSet<String>, ProviderError>;

    /// Look up one volume. Pure query, no side effect.
    fn resolve_volume(&self, volume_id: &str) -> VolumeLookup;

    /// Delete one snapshot by id.
    fn delete_snapshot(&self, snapshot_id: &str) -> Result<(), ProviderError>;
}
