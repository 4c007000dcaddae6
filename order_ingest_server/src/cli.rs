//! The server takes its configuration from the environment. The command line only offers ways to inspect it.
use std::{env, env::VarError};

use crate::config::ServerConfig;

/// The variables the server reads, in the order they are listed in the help text.
pub const CONFIG_ENVS: [&str; 12] = [
    "OIS_HOST",
    "OIS_PORT",
    "OIS_DATABASE_URL",
    "OIS_DB_MAX_CONNECTIONS",
    "OIS_CACHE_TTL_SECS",
    "OIS_CACHE_MAX_ENTRIES",
    "OIS_BOOTSTRAP_MODE",
    "OIS_BOOTSTRAP_PAGE_SIZE",
    "OIS_MAX_DELIVERY_ATTEMPTS",
    "OIS_RETRY_BACKOFF_MS",
    "OIS_SHUTDOWN_GRACE_SECS",
    "RUST_LOG",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliAction {
    /// No arguments: start the server.
    Serve,
    /// `--config`: print the environment and the configuration it resolves to.
    ShowConfig,
    /// Anything else prints the help text.
    Help,
}

impl CliAction {
    pub fn from_args<I: IntoIterator<Item = String>>(args: I) -> Self {
        let args = args.into_iter().skip(1).collect::<Vec<_>>();
        match args.as_slice() {
            [] => Self::Serve,
            [flag] if flag == "--config" => Self::ShowConfig,
            _ => Self::Help,
        }
    }
}

/// Handles any command-line arguments. Returns `true` if the process should exit instead of starting the server.
pub fn handle_command_line_args() -> bool {
    match CliAction::from_args(env::args()) {
        CliAction::Serve => false,
        CliAction::ShowConfig => {
            print_environment();
            println!("\nEffective configuration:\n{:#?}", ServerConfig::from_env_or_default());
            true
        },
        CliAction::Help => {
            println!("\n{}\n", include_str!("./cli-help.txt"));
            print_environment();
            true
        },
    }
}

fn print_environment() {
    println!("Current environment values:");
    for name in CONFIG_ENVS {
        println!("  {name:<35} {}", describe_var(env::var(name)));
    }
}

fn describe_var(value: Result<String, VarError>) -> String {
    match value {
        Ok(s) => s,
        Err(VarError::NotPresent) => "Not set".into(),
        Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
    }
}
