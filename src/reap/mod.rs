//! Staleness classifier and executor.
//!
//! Walks the snapshot inventory once, classifying each snapshot by tracing
//! it to its volume and the volume's first attachment:
//! - no volume reference, volume gone, volume detached, or attached instance
//!   not live -> stale, delete
//! - attached to a live instance -> retain
//! - volume lookup failed transiently -> skip, leave the snapshot alone
//!
//! Only the two upfront inventory listings are run-fatal; everything after
//! that is per-snapshot and never aborts the run.

use std::collections::HashSet;
use std::fmt;

use chrono::Utc;

use crate::config::Config;
use crate::provider::{Provider, ProviderError, Snapshot, VolumeLookup};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaleReason {
    /// Snapshot has no volume reference at all.
    Orphaned,
    /// Referenced volume no longer exists in the inventory.
    VolumeDeleted,
    /// Volume exists but has no attachments.
    VolumeDetached,
    /// Volume's first attachment points at an instance that is not live.
    InstanceGone,
}

impl fmt::Display for StaleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            StaleReason::Orphaned => "no associated volume",
            StaleReason::VolumeDeleted => "volume deleted",
            StaleReason::VolumeDetached => "volume not attached to any instance",
            StaleReason::InstanceGone => "attached instance no longer exists",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Stale(StaleReason),
    Live,
    /// Volume lookup failed; the snapshot cannot be classified this run.
    Undetermined(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Deleted,
    DeleteFailed,
    Retained,
    Skipped,
}

/// One terminal outcome per snapshot, kept for auditing the run.
#[derive(Debug, Clone)]
pub struct ActionRecord {
    pub snapshot_id: String,
    pub action: Action,
    pub detail: String,
}

#[derive(Default)]
pub struct ReapResult {
    pub records: Vec<ActionRecord>,
}

impl ReapResult {
    pub fn count(&self, action: Action) -> usize {
        self.records.iter().filter(|r| r.action == action).count()
    }
}

/// Classify one snapshot against the live-instance set.
///
/// Depends only on this snapshot's volume reference, the resolved volume,
/// and the live set - never on other snapshots. Issues at most one volume
/// lookup and no other provider call.
pub fn classify(
    snapshot: &Snapshot,
    live_instances: &HashSet<String>,
    provider: &dyn Provider,
) -> Classification {
    // absent and empty volume references both mean orphaned
    let volume_id = match snapshot.volume_id.as_deref() {
        Some(id) if !id.is_empty() => id,
        _ => return Classification::Stale(StaleReason::Orphaned),
    };

    match provider.resolve_volume(volume_id) {
        VolumeLookup::NotFound => Classification::Stale(StaleReason::VolumeDeleted),
        VolumeLookup::Found(attachments) => {
            // only the first attachment is consulted; EBS volumes have at
            // most one in normal use and multi-attach is not aggregated
            match attachments.first() {
                None => Classification::Stale(StaleReason::VolumeDetached),
                Some(attachment) => {
                    if live_instances.contains(&attachment.instance_id) {
                        Classification::Live
                    } else {
                        Classification::Stale(StaleReason::InstanceGone)
                    }
                }
            }
        }
        VolumeLookup::TransientError(detail) => Classification::Undetermined(detail),
    }
}

/// Fetch the inventory, classify every snapshot, and delete the stale ones.
///
/// Either listing failing aborts before any deletion is attempted; a failed
/// delete or an unclassifiable snapshot is logged and the run continues.
pub fn run(provider: &dyn Provider, config: &Config) -> Result<ReapResult, ProviderError> {
    let snapshots = provider.list_snapshots()?;
    let live_instances = provider.list_live_instance_ids()?;

    let mut result = ReapResult::default();

    for snapshot in &snapshots {
        match classify(snapshot, &live_instances, provider) {
            Classification::Stale(reason) => match provider.delete_snapshot(&snapshot.id) {
                Ok(()) => {
                    println!("deleted snapshot {} ({reason})", snapshot.id);
                    result.records.push(ActionRecord {
                        snapshot_id: snapshot.id.clone(),
                        action: Action::Deleted,
                        detail: reason.to_string(),
                    });
                }
                Err(e) => {
                    eprintln!("failed to delete snapshot {}: {e}", snapshot.id);
                    result.records.push(ActionRecord {
                        snapshot_id: snapshot.id.clone(),
                        action: Action::DeleteFailed,
                        detail: e.to_string(),
                    });
                }
            },
            Classification::Live => {
                if config.verbose {
                    println!(
                        "retained snapshot {}{} (volume attached to live instance)",
                        snapshot.id,
                        age_suffix(snapshot)
                    );
                }
                result.records.push(ActionRecord {
                    snapshot_id: snapshot.id.clone(),
                    action: Action::Retained,
                    detail: "volume attached to live instance".to_string(),
                });
            }
            Classification::Undetermined(detail) => {
                eprintln!("error processing snapshot {}: {detail}", snapshot.id);
                result.records.push(ActionRecord {
                    snapshot_id: snapshot.id.clone(),
                    action: Action::Skipped,
                    detail,
                });
            }
        }
    }

    Ok(result)
}

fn age_suffix(snapshot: &Snapshot) -> String {
    match snapshot.start_time {
        Some(start) => {
            let days = (Utc::now() - start).num_days();
            format!(", {days}d old")
        }
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::memory::MemoryProvider;

    fn snapshot(id: &str, volume_id: Option<&str>) -> Snapshot {
        Snapshot {
            id: id.to_string(),
            volume_id: volume_id.map(str::to_string),
            start_time: None,
        }
    }

    #[test]
    fn no_volume_reference_is_orphaned() {
        let provider = MemoryProvider::new();
        let live = HashSet::new();

        let classification = classify(&snapshot("snap-1", None), &live, &provider);
        assert_eq!(classification, Classification::Stale(StaleReason::Orphaned));
    }

    #[test]
    fn empty_volume_reference_is_orphaned() {
        let provider = MemoryProvider::new();
        let live = HashSet::new();

        let classification = classify(&snapshot("snap-1", Some("")), &live, &provider);
        assert_eq!(classification, Classification::Stale(StaleReason::Orphaned));
    }

    #[test]
    fn missing_volume_is_stale() {
        let provider = MemoryProvider::new();
        let live = HashSet::new();

        let classification = classify(&snapshot("snap-1", Some("vol-1")), &live, &provider);
        assert_eq!(
            classification,
            Classification::Stale(StaleReason::VolumeDeleted)
        );
    }

    #[test]
    fn detached_volume_is_stale() {
        let provider = MemoryProvider::new().with_volume("vol-1", &[]);
        let live = HashSet::new();

        let classification = classify(&snapshot("snap-1", Some("vol-1")), &live, &provider);
        assert_eq!(
            classification,
            Classification::Stale(StaleReason::VolumeDetached)
        );
    }

    #[test]
    fn attachment_to_live_instance_is_retained() {
        let provider = MemoryProvider::new().with_volume("vol-1", &["i-100"]);
        let live = HashSet::from(["i-100".to_string()]);

        let classification = classify(&snapshot("snap-1", Some("vol-1")), &live, &provider);
        assert_eq!(classification, Classification::Live);
    }

    #[test]
    fn attachment_to_dead_instance_is_stale() {
        let provider = MemoryProvider::new().with_volume("vol-1", &["i-200"]);
        let live = HashSet::from(["i-100".to_string()]);

        let classification = classify(&snapshot("snap-1", Some("vol-1")), &live, &provider);
        assert_eq!(
            classification,
            Classification::Stale(StaleReason::InstanceGone)
        );
    }

    #[test]
    fn only_first_attachment_is_consulted() {
        // first attachment dead, second live: still stale
        let provider = MemoryProvider::new().with_volume("vol-1", &["i-200", "i-100"]);
        let live = HashSet::from(["i-100".to_string()]);

        let classification = classify(&snapshot("snap-1", Some("vol-1")), &live, &provider);
        assert_eq!(
            classification,
            Classification::Stale(StaleReason::InstanceGone)
        );
    }

    #[test]
    fn transient_lookup_failure_is_undetermined() {
        let provider = MemoryProvider::new().with_faulted_volume("vol-1", "throttled");
        let live = HashSet::new();

        let classification = classify(&snapshot("snap-1", Some("vol-1")), &live, &provider);
        assert_eq!(
            classification,
            Classification::Undetermined("throttled".to_string())
        );
    }

    #[test]
    fn classification_is_idempotent_over_static_inventory() {
        let provider = MemoryProvider::new()
            .with_volume("vol-1", &["i-100"])
            .with_volume("vol-2", &[]);
        let live = HashSet::from(["i-100".to_string()]);

        let snapshots = [
            snapshot("snap-1", Some("vol-1")),
            snapshot("snap-2", Some("vol-2")),
            snapshot("snap-3", None),
        ];

        let first: Vec<_> = snapshots
            .iter()
            .map(|s| classify(s, &live, &provider))
            .collect();
        let second: Vec<_> = snapshots
            .iter()
            .map(|s| classify(s, &live, &provider))
            .collect();

        assert_eq!(first, second);
    }
}
