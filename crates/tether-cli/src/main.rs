//! Entrypoint for the `tether` launcher binary.
//!
//! Delegates to [`tether_cli::run`] with the real process streams.

use std::io;
use std::process::ExitCode;

fn main() -> ExitCode {
    // Unlocked handles: background threads log to stderr during the run.
    let mut stdout = io::stdout();
    let mut stderr = io::stderr();
    tether_cli::run(std::env::args_os(), &mut stdout, &mut stderr)
}
