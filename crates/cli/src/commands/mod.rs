use clap::Subcommand;
use std::path::PathBuf;
use tripwire_config::{ResilienceSettings, SettingsLoader};
use tripwire_resilience::OperationCategory;

pub mod presets;
pub mod simulate;

#[derive(Subcommand)]
pub enum Commands {
    /// Print the effective settings for every operation category as JSON
    Presets {
        /// Settings file to apply on top of the built-in presets
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
    },

    /// Run a scripted flaky operation through a resilience strategy
    Simulate {
        /// Operation category whose settings are used
        #[arg(long, default_value = "default")]
        category: OperationCategory,

        /// Number of external calls to make
        #[arg(long, default_value = "5")]
        calls: u32,

        /// Number of attempts that fail before the operation starts succeeding
        #[arg(long, default_value = "0")]
        failures: u32,

        /// Fail with a non-transient error instead of a connection error
        #[arg(long)]
        permanent: bool,

        /// Skip the waits between retry attempts
        #[arg(long)]
        no_delay: bool,

        /// Settings file to apply on top of the built-in presets
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
}

impl Commands {
    pub async fn execute(self) -> eyre::Result<()> {
        match self {
            Commands::Presets { config } => {
                let settings = load_settings(config)?;
                presets::execute(&settings)
            }
            Commands::Simulate {
                category,
                calls,
                failures,
                permanent,
                no_delay,
                config,
            } => {
                let settings = load_settings(config)?;
                let plan = simulate::FailurePlan {
                    failures,
                    permanent,
                };
                simulate::execute(&settings, category, calls, plan, no_delay).await
            }
        }
    }
}

fn load_settings(config: Option<PathBuf>) -> eyre::Result<ResilienceSettings> {
    let mut loader = SettingsLoader::new();
    if let Some(path) = config {
        loader = loader.file(path);
    }
    Ok(loader.load()?)
}
