//! snapsweep - stale EBS snapshot reaper.
//!
//! Classifies every snapshot in the account by tracing it to its volume and
//! the volume's attached instance, then deletes the snapshots nothing live
//! can reach. Stateless: each run works only from the provider inventory at
//! the moment of invocation.

pub mod cli;
pub mod config;
pub mod provider;
pub mod reap;
pub mod report;
