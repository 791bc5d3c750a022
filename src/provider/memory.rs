//! In-memory provider for tests and benchmarks.
//!
//! Holds a fixed inventory and records deletions instead of performing them,
//! so classifier behavior can be exercised with no network access.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use super::{Attachment, Provider, ProviderError, Snapshot, VolumeLookup};

#[derive(Default)]
pub struct MemoryProvider {
    snapshots: Vec<Snapshot>,
    live_instances: HashSet<String>,
    volumes: HashMap<String, VolumeLookup>,
    deleted: RefCell<Vec<String>>,
    fail_listing: bool,
    fail_deletes: bool,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(mut self, id: &str, volume_id: Option<&str>) -> Self {
        self.snapshots.push(Snapshot {
            id: id.to_string(),
            volume_id: volume_id.map(str::to_string),
            start_time: None,
        });
        self
    }

    /// Register an existing volume attached to the given instances (in order).
    pub fn with_volume(mut self, id: &str, attached_to: &[&str]) -> Self {
        let attachments = attached_to
            .iter()
            .map(|i| Attachment {
                instance_id: i.to_string(),
            })
            .collect();
        self.volumes
            .insert(id.to_string(), VolumeLookup::Found(attachments));
        self
    }

    /// Register a volume whose lookup fails with a transient error.
    pub fn with_faulted_volume(mut self, id: &str, detail: &str) -> Self {
        self.volumes
            .insert(id.to_string(), VolumeLookup::TransientError(detail.to_string()));
        self
    }

    pub fn with_live_instance(mut self, id: &str) -> Self {
        self.live_instances.insert(id.to_string());
        self
    }

    /// Make both inventory listings fail, as if the provider were unreachable.
    pub fn with_failing_listing(mut self) -> Self {
        self.fail_listing = true;
        self
    }

    /// Make every delete call fail.
    pub fn with_failing_deletes(mut self) -> Self {
        self.fail_deletes = true;
        self
    }

    /// Snapshot ids deleted so far, in deletion order.
    pub fn deleted(&self) -> Vec<String> {
        self.deleted.borrow().clone()
    }
}

impl Provider for MemoryProvider {
    fn list_snapshots(&self) -> Result<Vec<Snapshot>, ProviderError> {
        if self.fail_listing {
            return Err(ProviderError::Command("inventory unavailable".to_string()));
        }
        Ok(self.snapshots.clone())
    }

    fn list_live_instance_ids(&self) -> Result<HashSet<String>, ProviderError> {
        if self.fail_listing {
            return Err(ProviderError::Command("inventory unavailable".to_string()));
        }
        Ok(self.live_instances.clone())
    }

    fn resolve_volume(&self, volume_id: &str) -> VolumeLookup {
        // unregistered volumes do not exist in the inventory
        self.volumes
            .get(volume_id)
            .cloned()
            .unwrap_or(VolumeLookup::NotFound)
    }

    fn delete_snapshot(&self, snapshot_id: &str) -> Result<(), ProviderError> {
        if self.fail_deletes {
            return Err(ProviderError::Command(format!(
                "delete-snapshot {snapshot_id} refused"
            )));
        }
        self.deleted.borrow_mut().push(snapshot_id.to_string());
        Ok(())
    }
}
