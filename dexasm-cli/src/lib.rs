//! Helpers shared by the `dexdasm` and `dexreasm` binaries.

use std::fmt::Display;
use std::process;

use clap::Parser;

/// Parse the command line, exiting with status 1 on a usage error.
///
/// `--help` and `--version` still print to stdout and exit with 0.
pub fn parse_args<T: Parser>() -> T {
    match T::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            process::exit(if e.use_stderr() { 1 } else { 0 });
        }
    }
}

/// Print `Error: {e}` and exit with status 1.
pub fn fail(e: impl Display) -> ! {
    eprintln!("Error: {e}");
    process::exit(1);
}
