//! Command-line and environment configuration for the binary.

use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_BIND: &str = "127.0.0.1:8080";

#[derive(Parser, Debug)]
#[command(
    name = "seating_solver",
    about = "Conflict-aware exam seating: serve the HTTP API or solve one input file"
)]
pub struct Args {
    /// Address the HTTP server listens on.
    #[arg(long, env = "SEATING_BIND", default_value = DEFAULT_BIND, global = true)]
    pub bind: SocketAddr,

    /// Default log filter; RUST_LOG takes precedence.
    #[arg(long, env = "SEATING_LOG", default_value = "info", global = true)]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run the HTTP server (default).
    Serve,
    /// Read a seating input JSON file and print the generated seating.
    Solve {
        #[arg(name = "INPUT")]
        input: PathBuf,
        /// Print single-line JSON.
        #[arg(long)]
        compact: bool,
    },
}

impl Args {
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Serve)
    }
}
