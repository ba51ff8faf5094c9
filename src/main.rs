//! valkey-admin - console for Valkey/Redis deployments
//!
//! Runs a single console command, an auto-query, a scan page or a topology
//! listing, or drops into an interactive prompt.

use tracing::{error, Level};
use tracing_subscriber::FmtSubscriber;

mod console;

use valkey_admin::config::CliArgs;

fn setup_logging(verbose: bool, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else if verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

fn main() {
    let args = CliArgs::parse_args();
    setup_logging(args.verbose, args.quiet);

    if let Err(e) = console::run(&args) {
        error!("Error: {:#}", e);
        std::process::exit(1);
    }
}
