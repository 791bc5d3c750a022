use crate::cli::Cli;

#[derive(Default)]
pub struct Config {
    pub verbose: bool,
}

impl Config {
    pub fn from_args(cli: &Cli) -> Self {
        Config {
            verbose: cli.verbose,
        }
    }
}
