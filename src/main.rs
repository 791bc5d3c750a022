use clap::Parser;
use snapsweep::cli::Cli;
use snapsweep::config::Config;
use snapsweep::provider::awscli::AwsCliProvider;
use snapsweep::reap;
use snapsweep::report;

fn main() {
    let cli = Cli::parse();
    let config = Config::from_args(&cli);
    let provider = AwsCliProvider::new();

    match reap::run(&provider, &config) {
        Ok(result) => {
            report::print(&result, &config);
        }
        Err(e) => {
            // listing failed; nothing was classified or deleted
            eprintln!("snapsweep: {e}");
            std::process::exit(1);
        }
    }
}
