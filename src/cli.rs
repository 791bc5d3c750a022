use clap::Parser;

/// The job takes no parameters beyond observability flags; it is meant to be
/// fired by a scheduler and work purely from the live inventory.
#[derive(Parser)]
#[command(name = "snapsweep")]
#[command(about = "Deletes EBS snapshots no longer reachable from any live instance")]
#[command(version)]
pub struct Cli {
    /// Also print retained snapshots and extra diagnostics
    #[arg(long, short = 'v', default_value_t = false)]
    pub verbose: bool,
}
