use clap::Parser;
use idxbench::cli::{init_logging, run, Cli};

fn main() -> std::process::ExitCode {
    init_logging();
    run(Cli::parse())
}
