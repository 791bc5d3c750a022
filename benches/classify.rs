use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::collections::HashSet;

use snapsweep::provider::memory::MemoryProvider;
use snapsweep::provider::Snapshot;
use snapsweep::reap;

/// Fixture generator for synthetic inventories
mod fixtures {
    use super::*;

    /// Build an inventory with an even mix of outcomes: orphaned, volume
    /// gone, detached, attached-to-dead, attached-to-live.
    pub fn mixed_inventory(snapshot_count: usize) -> (MemoryProvider, Vec<Snapshot>, HashSet<String>) {
        let mut provider = MemoryProvider::new().with_live_instance("i-live");
        let mut snapshots = Vec::with_capacity(snapshot_count);

        for n in 0..snapshot_count {
            let snap_id = format!("snap-{n}");
            let vol_id = format!("vol-{n}");

            let volume_id = match n % 5 {
                0 => None,
                1 => Some(vol_id.as_str()), // never registered: volume gone
                2 => {
                    provider = provider.with_volume(&vol_id, &[]);
                    Some(vol_id.as_str())
                }
                3 => {
                    provider = provider.with_volume(&vol_id, &["i-dead"]);
                    Some(vol_id.as_str())
                }
                _ => {
                    provider = provider.with_volume(&vol_id, &["i-live"]);
                    Some(vol_id.as_str())
                }
            };

            snapshots.push(Snapshot {
                id: snap_id,
                volume_id: volume_id.map(str::to_string),
                start_time: None,
            });
        }

        let live = HashSet::from(["i-live".to_string()]);
        (provider, snapshots, live)
    }
}

/// Benchmark: classification cost across inventory sizes
fn bench_classify_inventory(c: &mut Criterion) {
    let mut group = c.benchmark_group("classify_inventory");

    for count in [100, 1_000, 10_000] {
        group.bench_with_input(BenchmarkId::new("snapshots", count), &count, |b, &count| {
            let (provider, snapshots, live) = fixtures::mixed_inventory(count);

            b.iter(|| {
                for snapshot in &snapshots {
                    let classification =
                        reap::classify(black_box(snapshot), &live, &provider);
                    black_box(classification);
                }
            });
        });
    }

    group.finish();
}

/// Benchmark: the worst case for the live-set lookup, every snapshot's
/// volume attached to some instance
fn bench_classify_all_attached(c: &mut Criterion) {
    c.bench_function("classify_all_attached", |b| {
        let mut provider = MemoryProvider::new();
        let mut live = HashSet::new();
        let mut snapshots = Vec::new();

        for n in 0..1_000 {
            let instance = format!("i-{n}");
            let vol_id = format!("vol-{n}");
            provider = provider.with_volume(&vol_id, &[instance.as_str()]);
            live.insert(instance);
            snapshots.push(Snapshot {
                id: format!("snap-{n}"),
                volume_id: Some(vol_id),
                start_time: None,
            });
        }

        b.iter(|| {
            for snapshot in &snapshots {
                let classification = reap::classify(black_box(snapshot), &live, &provider);
                black_box(classification);
            }
        });
    });
}

criterion_group!(benches, bench_classify_inventory, bench_classify_all_attached);

criterion_main!(benches);
