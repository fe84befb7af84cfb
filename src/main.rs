use std::process::ExitCode;

use clap::Parser;
use finly::cli::{describe_error, Cli};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    cli.init_tracing();

    match cli.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::debug!(error = ?err, "command failed");
            eprintln!("Error: {}", describe_error(&err));
            ExitCode::FAILURE
        }
    }
}
