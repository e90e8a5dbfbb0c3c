use clap::Parser;
use oho::cli::{init_logging, run_command, Cli};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run_command(&cli).await {
        tracing::error!(error = %e, "oho failed");
        std::process::exit(1);
    }
}
