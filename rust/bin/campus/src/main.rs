//! `campus` — client-side auth and diagnostics tool.
//!
//! Runs the account lifecycle against the in-memory identity provider and
//! manages the client config file.

mod commands;
mod config;

use clap::{Parser, Subcommand};

use commands::run::RunArgs;

/// Campus client tool.
#[derive(Parser, Debug)]
#[command(name = "campus", about = "Campus auth client")]
struct Cli {
    /// Path to client config file (default: ~/.campus/config.toml).
    #[arg(long = "config", global = true)]
    config: Option<String>,

    /// Build mode override: development or production.
    #[arg(long = "mode", env = "CAMPUS_MODE", global = true)]
    mode: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Sign up, sign in, reset and update the password, then sign out.
    Run {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        /// Password set by the update step.
        #[arg(long, default_value = "changed-secret")]
        new_password: String,
        /// Profile username (default: the email's local part).
        #[arg(long)]
        username: Option<String>,
        /// Make the profile write fail after the account is created.
        #[arg(long)]
        fail_profile: bool,
    },

    /// Client config management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Show version.
    Version,
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the effective config.
    Show,
    /// Write the effective config to the config path.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    let config_path = cli
        .config
        .map(std::path::PathBuf::from)
        .unwrap_or_else(config::ClientConfig::default_path);
    let mut client_config = config::ClientConfig::load(&config_path)?;
    client_config.override_mode(cli.mode.as_deref())?;

    match cli.command {
        Commands::Run {
            email,
            password,
            new_password,
            username,
            fail_profile,
        } => {
            if email.trim().is_empty() {
                anyhow::bail!("Email cannot be empty.");
            }
            let args = RunArgs {
                email,
                password,
                new_password,
                username,
                fail_profile,
            };
            commands::run::run(&client_config, args).await?;
        }

        Commands::Config { action } => match action {
            ConfigAction::Show => {
                commands::config::show(&client_config, &config_path)?;
            }
            ConfigAction::Init { force } => {
                commands::config::init(&client_config, &config_path, force)?;
            }
        },

        Commands::Version => {
            println!("campus v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
