//! assetpipe - Command-line front end for the asset build orchestration library

use std::process::ExitCode;

use assetpipe::cli;

fn main() -> ExitCode {
    cli::run()
}
