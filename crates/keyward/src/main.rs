// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Keyward - a local credential broker.
//!
//! `keyward serve` runs the broker; the other subcommands are thin clients
//! of its socket, plus `init` for creating a keyring.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod client;
mod init;
mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use keyward_config::model::KeywardConfig;

/// Keyward - a local credential broker.
#[derive(Parser, Debug)]
#[command(name = "keyward", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the broker in the foreground.
    Serve,
    /// Create a new, empty keyring.
    Init,
    /// Check that the broker is reachable.
    Ping,
    /// Print the username and password stored under ID.
    GetPassword { id: String },
    /// Store a username and password under ID. The password is read from the
    /// terminal, or from the first line of stdin.
    AddPassword { id: String, username: String },
    /// Print the key stored under ID.
    GetKey { id: String },
    /// Store a key under ID, read from the first line of stdin.
    AddKey { id: String },
}

fn load_config(path: Option<&PathBuf>) -> KeywardConfig {
    let loaded = match path {
        Some(path) => keyward_config::load_and_validate_path(path),
        None => keyward_config::load_and_validate(),
    };
    match loaded {
        Ok(config) => config,
        Err(errors) => {
            keyward_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref());

    let result = match cli.command {
        Commands::Serve => serve::run_serve(config).await,
        Commands::Init => init::run_init(&config).await,
        Commands::Ping => client::ping(&config).await,
        Commands::GetPassword { id } => client::get_password(&config, &id).await,
        Commands::AddPassword { id, username } => {
            client::add_password(&config, &id, &username).await
        }
        Commands::GetKey { id } => client::get_key(&config, &id).await,
        Commands::AddKey { id } => client::add_key(&config, &id).await,
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("keyward: {e}");
            std::process::exit(1);
        }
    }
}
