use clap::Parser;
use tripwire::{logging, Commands};

#[derive(Parser)]
#[command(name = "tripwire")]
#[command(about = "Inspect and exercise circuit breaker and retry presets", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    if let Err(e) = logging::init() {
        eprintln!("Failed to initialize logging: {e}");
    }

    cli.command.execute().await
}
