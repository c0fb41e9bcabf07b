use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;
use client::{FileStore, storage::load_session};
use shared::{config::ClientConfig, models::Session};

use crate::logging::initialize_tracing;

#[derive(Args, Debug)]
pub struct SessionArgs {
    /// Path to the configuration file (yaml, json or toml)
    #[arg(long, short)]
    pub config: Option<PathBuf>,
}

pub fn show(args: SessionArgs) -> Result<()> {
    let config = ClientConfig::load_config(args.config, None)?;
    initialize_tracing(&config);

    let path = config.resolved_storage_path();
    match load_session(&FileStore::new(path.clone()))? {
        Some(session) => print_session_summary(&session, &path),
        None => println!("No session stored at {}", path.display()),
    }
    Ok(())
}

/// Prints who is logged in. The token value itself is never shown.
pub fn print_session_summary(session: &Session, path: &Path) {
    println!(
        "Signed in as {}",
        session.user.username().unwrap_or("<unknown user>")
    );
    if let Some(profile) = session.user.profile() {
        println!("  email: {}", profile.email);
        let roles = profile.role_names();
        if !roles.is_empty() {
            println!("  roles: {}", roles.join(", "));
        }
    }
    let token = if session.token.is_some() {
        "stored"
    } else {
        "none"
    };
    println!("  token: {token}");
    println!("Session stored at {}", path.display());
}
