//! AWS CLI provider adapter.
//!
//! Queries EC2 through the `aws` command line tool with `--output json`:
//! - `describe-snapshots --owner-ids self` for the snapshot inventory
//! - `describe-instances` filtered to running/stopped for the live set
//! - `describe-volumes --volume-ids <id>` for per-snapshot volume lookup
//! - `delete-snapshot --snapshot-id <id>` for the delete action
//!
//! Credentials and region come from the calling environment (profile, role,
//! instance metadata), never from this adapter.
//!
//! Handles gracefully:
//! - aws cli not installed
//! - expired or missing credentials (surfaces the cli's own message)
//! - `InvalidVolume.NotFound`, which is a classification input, not an error

use std::collections::HashSet;
use std::process::Command;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::{Attachment, Provider, ProviderError, Snapshot, VolumeLookup};

pub struct AwsCliProvider;

impl AwsCliProvider {
    pub fn new() -> Self {
        AwsCliProvider
    }
}

impl Default for AwsCliProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct DescribeSnapshotsResponse {
    #[serde(rename = "Snapshots", default)]
    snapshots: Vec<SnapshotEntry>,
}

#[derive(Debug, Deserialize)]
struct SnapshotEntry {
    #[serde(rename = "SnapshotId")]
    snapshot_id: String,
    #[serde(rename = "VolumeId")]
    volume_id: Option<String>,
    #[serde(rename = "StartTime")]
    start_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct DescribeInstancesResponse {
    #[serde(rename = "Reservations", default)]
    reservations: Vec<Reservation>,
}

#[derive(Debug, Deserialize)]
struct Reservation {
    #[serde(rename = "Instances", default)]
    instances: Vec<InstanceEntry>,
}

#[derive(Debug, Deserialize)]
struct InstanceEntry {
    #[serde(rename = "InstanceId")]
    instance_id: String,
}

#[derive(Debug, Deserialize)]
struct DescribeVolumesResponse {
    #[serde(rename = "Volumes", default)]
    volumes: Vec<VolumeEntry>,
}

#[derive(Debug, Deserialize)]
struct VolumeEntry {
    #[serde(rename = "Attachments", default)]
    attachments: Vec<AttachmentEntry>,
}

#[derive(Debug, Deserialize)]
struct AttachmentEntry {
    #[serde(rename = "InstanceId")]
    instance_id: String,
}

impl Provider for AwsCliProvider {
    fn list_snapshots(&self) -> Result<Vec<Snapshot>, ProviderError> {
        let stdout = run_aws(&[
            "ec2",
            "describe-snapshots",
            "--owner-ids",
            "self",
            "--output",
            "json",
        ])?;
        parse_snapshots(&stdout)
    }

    fn list_live_instance_ids(&self) -> Result<HashSet<String>, ProviderError> {
        let stdout = run_aws(&[
            "ec2",
            "describe-instances",
            "--filters",
            "Name=instance-state-name,Values=running,stopped",
            "--output",
            "json",
        ])?;
        parse_live_instance_ids(&stdout)
    }

    fn resolve_volume(&self, volume_id: &str) -> VolumeLookup {
        let output = Command::new("aws")
            .args([
                "ec2",
                "describe-volumes",
                "--volume-ids",
                volume_id,
                "--output",
                "json",
            ])
            .output();

        let output = match output {
            Ok(o) => o,
            Err(e) => {
                return VolumeLookup::TransientError(format!("failed to run aws cli: {e}"));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if is_volume_not_found(&stderr) {
                return VolumeLookup::NotFound;
            }
            return VolumeLookup::TransientError(stderr.trim().to_string());
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        match parse_volume_attachments(&stdout) {
            Ok(Some(attachments)) => VolumeLookup::Found(attachments),
            // describe-volumes with an id either errors or returns the volume;
            // an empty list still means the volume is gone
            Ok(None) => VolumeLookup::NotFound,
            Err(e) => VolumeLookup::TransientError(e.to_string()),
        }
    }

    fn delete_snapshot(&self, snapshot_id: &str) -> Result<(), ProviderError> {
        run_aws(&["ec2", "delete-snapshot", "--snapshot-id", snapshot_id])?;
        Ok(())
    }
}

fn run_aws(args: &[&str]) -> Result<String, ProviderError> {
    let output = Command::new("aws")
        .args(args)
        .output()
        .map_err(|e| ProviderError::Command(format!("failed to run aws cli: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ProviderError::Command(format!(
            "aws {} failed: {}",
            args.get(1).copied().unwrap_or("ec2"),
            stderr.trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// The cli reports a missing volume as a client error on stderr, e.g.
/// `An error occurred (InvalidVolume.NotFound) when calling the
/// DescribeVolumes operation: The volume 'vol-...' does not exist.`
fn is_volume_not_found(stderr: &str) -> bool {
    stderr.contains("InvalidVolume.NotFound")
}

fn parse_snapshots(json: &str) -> Result<Vec<Snapshot>, ProviderError> {
    let response: DescribeSnapshotsResponse =
        serde_json::from_str(json).map_err(|e| ProviderError::Parse(e.to_string()))?;

    Ok(response
        .snapshots
        .into_iter()
        .map(|entry| Snapshot {
            id: entry.snapshot_id,
            volume_id: entry.volume_id,
            start_time: entry.start_time,
        })
        .collect())
}

/// Flatten the nested reservation/instance shape into a flat id set so the
/// classifier never sees the nesting.
fn parse_live_instance_ids(json: &str) -> Result<HashSet<String>, ProviderError> {
    let response: DescribeInstancesResponse =
        serde_json::from_str(json).map_err(|e| ProviderError::Parse(e.to_string()))?;

    Ok(response
        .reservations
        .into_iter()
        .flat_map(|r| r.instances)
        .map(|i| i.instance_id)
        .collect())
}

fn parse_volume_attachments(json: &str) -> Result<Option<Vec<Attachment>>, ProviderError> {
    let response: DescribeVolumesResponse =
        serde_json::from_str(json).map_err(|e| ProviderError::Parse(e.to_string()))?;

    Ok(response.volumes.into_iter().next().map(|v| {
        v.attachments
            .into_iter()
            .map(|a| Attachment {
                instance_id: a.instance_id,
            })
            .collect()
    }))
}
