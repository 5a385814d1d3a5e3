pub mod doctor;

use clap::{Parser, Subcommand};

/// worldline-gateway — the World Progress Simulation session runtime.
#[derive(Debug, Parser)]
#[command(name = "worldline-gateway", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the gateway server (default when no subcommand is given).
    Serve,
    /// Apply pending database migrations and exit.
    Migrate,
    /// Run diagnostic checks against the current configuration.
    Doctor,
    /// Print version information.
    Version,
}
