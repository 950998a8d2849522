use kazky_core::logging;

mod cli;

use crate::cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();

    // Initialize logging as early as possible; fall back to stderr if the state dir is unusable.
    if let Err(err) = logging::init_logging(cli.verbose) {
        logging::init_logging_stderr(cli.verbose);
        tracing::warn!("file logging unavailable: {:#}", err);
    }

    if let Err(err) = cli.run().await {
        tracing::error!("{:#}", err);
        eprintln!("kazky error: {:#}", err);
        std::process::exit(1);
    }
}
