//! Main entry point for the `SignOn` command-line client.

use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand};
use dotenv::dotenv;

mod commands;
mod logging;

/// `SignOn` CLI
#[derive(Parser, Debug)]
#[command(name = "signon", version)]
#[command(about = "Log in to a SignOn server from the command line", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Subcommands for the `SignOn` CLI
#[derive(Subcommand, Debug)]
enum Commands {
    /// Log in with a username and password and store the session
    Login(commands::login::LoginArgs),

    /// Show the locally stored session
    Session(commands::session::SessionArgs),

    /// Generate a configuration file
    Config {
        /// Format of the configuration file to generate (yaml, json or toml). Defaults to yaml.
        #[arg(
            long,
            short,
            default_value = "yaml",
            help = "Format of the configuration file to generate (yaml, json or toml)."
        )]
        format: String,
    },

    /// Generate shell completion scripts for the CLI
    Completion {
        /// The shell type for which to generate the completion script (e.g., bash, zsh, fish, powershell)
        #[arg(
            long,
            short,
            help = "The shell type for which to generate the completion script (e.g., bash, zsh, fish, powershell)"
        )]
        shell: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Commands::Login(args) => commands::login::login(args).await?,
        Commands::Session(args) => commands::session::show(args)?,
        Commands::Config { format } => commands::config::generate_config(&format)?,
        Commands::Completion { shell } => {
            let shell = shell
                .parse::<clap_complete::Shell>()
                .map_err(|err| anyhow!("invalid shell type '{shell}': {err}"))?;
            commands::completion::generate_completion(shell);
        }
    }

    Ok(())
}
