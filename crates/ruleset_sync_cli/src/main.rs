use clap::{Parser, Subcommand};
use ruleset_sync_cli::{
    commands::{
        auth_cmd::{self, AuthCommands},
        sync_cmd::{self, ConflictPolicyArg, SyncArgs},
    },
    config::AppConfig,
};
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;

/// Environment variable holding the log filter.
const LOG_ENV_VAR: &str = "RULESET_SYNC_LOG";

/// ruleset-sync CLI: apply the main branch ruleset to GitHub repositories
#[derive(Parser, Debug)]
#[command(name = "ruleset-sync")]
#[command(
    about = "Apply the main branch ruleset to GitHub repositories",
    long_about = None
)]
struct Cli {
    /// Path to the configuration file (default: ./ruleset-sync.toml)
    #[arg(long, global = true)]
    config: Option<String>,

    /// What to do when a repository already has rulesets
    #[arg(long, global = true, value_enum)]
    conflict_policy: Option<ConflictPolicyArg>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(subcommand)]
    Auth(AuthCommands),

    /// Apply the ruleset to repositories
    Sync(SyncArgs),

    /// Show the CLI version
    Version,
}

fn load_config(cli: &Cli) -> AppConfig {
    match AppConfig::load_or_default(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("Error: {e}");
            eprintln!("Error: {e}");
            std::process::exit(e.exit_code());
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();
    match &cli.command {
        Commands::Auth(cmd) => {
            let config = load_config(&cli);
            if let Err(e) = auth_cmd::execute(cmd, &config).await {
                error!("Error: {e}");
                eprintln!("Error: {e}");
                std::process::exit(e.exit_code());
            }
        }
        Commands::Sync(args) => {
            let config = load_config(&cli);
            match sync_cmd::execute(args, cli.conflict_policy, &config).await {
                Ok(exit) => std::process::exit(exit.code()),
                Err(e) => {
                    error!("Error: {e}");
                    eprintln!("Error: {e}");
                    std::process::exit(e.exit_code());
                }
            }
        }
        Commands::Version => {
            println!(
                "ruleset-sync version {}",
                option_env!("RULESET_SYNC_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"))
            );
        }
    }
}
