use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
    sync::Arc,
};

use anyhow::{Context, Result, bail};
use clap::Args;
use client::{
    AuthClient, Field, FileStore, FormErrors, LoginController, SubmitOutcome,
    login::LOGIN_FAILED_MESSAGE,
};
use rpassword::prompt_password;
use shared::config::ClientConfig;
use tracing::debug;
use url::Url;

use crate::{commands::session::print_session_summary, logging::initialize_tracing};

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Path to the configuration file (yaml, json or toml)
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Base URL of the authentication server, overriding config and environment
    #[arg(long)]
    pub api_url: Option<Url>,

    /// Username to log in with; prompted for when omitted
    #[arg(long, short)]
    pub username: Option<String>,

    /// Read the password from the first line of stdin instead of prompting
    #[arg(long)]
    pub password_stdin: bool,
}

pub async fn login(args: LoginArgs) -> Result<()> {
    let config = ClientConfig::load_config(args.config, args.api_url)?;
    initialize_tracing(&config);

    let username = match args.username {
        Some(username) => username,
        None => prompt("Username: ")?,
    };
    let password = if args.password_stdin {
        read_stdin_line().context("failed to read password from stdin")?
    } else {
        prompt_password("Password: ").context("failed to read password")?
    };

    let storage_path = config.resolved_storage_path();
    debug!(path = %storage_path.display(), "using session store");
    let controller = LoginController::from_config(
        &config,
        Arc::new(AuthClient::new(&config)?),
        Arc::new(FileStore::new(storage_path.clone())),
        Arc::new(|route: &str| println!("Navigating to {route}")),
    );
    controller.set_field(Field::Username, username);
    controller.set_field(Field::Password, password);

    match controller.submit().await {
        SubmitOutcome::LoggedIn(session) => {
            if let Some(message) = controller.state().success {
                println!("{message}");
            }
            print_session_summary(&session, &storage_path);
            controller.wait_for_navigation().await;
            Ok(())
        }
        SubmitOutcome::Invalid(errors) => bail!(describe(&errors)),
        SubmitOutcome::Failed => {
            let message = controller
                .state()
                .errors
                .general
                .unwrap_or_else(|| LOGIN_FAILED_MESSAGE.to_string());
            bail!(message)
        }
        SubmitOutcome::Busy => bail!("a login is already in progress"),
    }
}

fn describe(errors: &FormErrors) -> String {
    [errors.field(Field::Username), errors.field(Field::Password)]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join("; ")
}

fn prompt(message: &str) -> Result<String> {
    print!("{message}");
    io::stdout().flush().ok();
    read_stdin_line()
}

fn read_stdin_line() -> Result<String> {
    let mut input = String::new();
    io::stdin().lock().read_line(&mut input)?;
    Ok(input.trim_end_matches(['\r', '\n']).to_string())
}
