use clap::Parser;
use rebalancer::cli::{Cli, run};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
