//! # CLI Interface
//!
//! Defines the command-line argument structure for `gyro-node` using
//! `clap` derive. Two subcommands: `run` and `version`.

use clap::{Parser, Subcommand};

/// Gyro registry node.
///
/// Hosts the Gyro spinner registry behind an HTTP API: minting, the
/// ownership book, the offer/bid marketplace, and the pull-payment
/// escrow, plus a Prometheus metrics endpoint.
#[derive(Parser, Debug)]
#[command(
    name = "gyro-node",
    about = "Gyro registry node",
    version,
    propagate_version = true
)]
pub struct GyroNodeCli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the Gyro node binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the registry node.
    Run(RunArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Port for the registry HTTP API.
    #[arg(long, env = "GYRO_API_PORT", default_value_t = 8940)]
    pub api_port: u16,

    /// Port for the Prometheus metrics endpoint.
    #[arg(long, env = "GYRO_METRICS_PORT", default_value_t = 8941)]
    pub metrics_port: u16,

    /// Hex-encoded owner address the registry is constructed with.
    ///
    /// When omitted, a random owner address is generated and logged at
    /// startup. Fine for development; production deployments pass an
    /// explicit address so the owner is known ahead of time.
    #[arg(long, env = "GYRO_OWNER")]
    pub owner: Option<String>,

    /// Log output format: "pretty" or "json".
    #[arg(long, env = "GYRO_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_structure() {
        // Ensures the derive macros produce a valid CLI definition.
        GyroNodeCli::command().debug_assert();
    }
}
