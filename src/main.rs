//! Latmon CLI entry point.

use latmon_lib::cli::{self, Cli};
use latmon_lib::core::Result;

fn main() -> Result<()> {
    // Parse command-line arguments
    let cli = Cli::parse_args();

    // Execute the command
    cli::execute(cli)
}
