use crate::config::Config;
use crate::reap::{Action, ReapResult};

pub fn print(result: &ReapResult, config: &Config) {
    let deleted = result.count(Action::Deleted);
    let retained = result.count(Action::Retained);
    let skipped = result.count(Action::Skipped);
    let failed = result.count(Action::DeleteFailed);

    if result.records.is_empty() {
        println!("no snapshots found");
        return;
    }

    println!("\n{deleted} deleted, {retained} retained, {skipped} skipped");

    if failed > 0 {
        eprintln!("{failed} delete request(s) failed, see errors above");
    }

    if config.verbose {
        println!("snapshots examined: {}", result.records.len());
    }
}
