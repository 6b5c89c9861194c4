use clap::Parser;
use megaclaim::cli::{Cli, Commands};
use megaclaim::config::AppConfig;
use megaclaim::error::{ClaimError, Result};
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

mod main_modes;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            init_logging_simple();
            error!("{}", e);
            eprintln!("❌ {}", e);
            return ExitCode::FAILURE;
        }
    };
    init_logging(&config);

    let outcome = match cli.command.clone().unwrap_or(Commands::Run { contract: None }) {
        Commands::Run { contract } => main_modes::run_claim(config, contract).await,
        Commands::Methods { address, json } => {
            main_modes::show_methods(&config, address.as_deref(), json)
        }
        Commands::Balance => main_modes::show_balance(&config).await,
    };

    match outcome {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!("{}", e);
            eprintln!("❌ {}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_config(path: &str) -> Result<AppConfig> {
    let config = AppConfig::load_from(path)?;
    config
        .validate()
        .map_err(|errors| ClaimError::InvalidConfig(errors.join("; ")))?;
    Ok(config)
}

fn init_logging(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    let _ = if config.logging.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

fn init_logging_simple() {
    // Minimal logging for startup failures
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .try_init();
}
