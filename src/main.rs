//! Economy journal replay CLI
//!
//! Replays a CSV journal of account operations against the in-memory economy
//! provider and prints the resulting balances as CSV.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- journal.csv > balances.csv
//! cargo run -- --negative-balances journal.csv > balances.csv
//! cargo run -- --currency gold:0:g --currency silver:2 -v journal.csv > balances.csv
//! ```
//!
//! Logs go to stderr; `RUST_LOG` overrides the `-v` level.
//!
//! # Exit Codes
//!
//! - 0: Success (rejected or malformed rows are logged, not fatal)
//! - 1: Error (missing arguments, file not found, invalid currencies, etc.)

use economy_registry::{cli, logging, Replayer};
use std::process;

fn main() {
    let args = cli::parse_args();
    logging::init(args.verbose);

    let replayer = Replayer::new(args.to_replay_config());

    let mut output = std::io::stdout();
    if let Err(e) = replayer.replay(&args.input_file, &mut output) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
