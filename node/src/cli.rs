//! # CLI Interface
//!
//! Defines the command-line argument structure for `agewitness-node` using
//! `clap` derive. Supports four subcommands: `run`, `init`, `hash`, and
//! `version`. Every `run` option can also come from an `AGEWITNESS_*`
//! environment variable.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use agewitness_protocol::config::{DEFAULT_API_PORT, DEFAULT_METRICS_PORT};

/// Name of the signing key file inside the data directory.
pub const SIGNING_KEY_FILE: &str = "signing.key";

/// Account age witness node.
///
/// Keeps a local witness store in sync with the payload store, publishes
/// this node's witnesses, verifies peers' claims and computes trade limits
/// over a JSON HTTP API. Exposes Prometheus metrics.
#[derive(Parser, Debug)]
#[command(
    name = "agewitness-node",
    about = "Account age witness node",
    version,
    propagate_version = true
)]
pub struct AgeWitnessCli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the node.
    Run(RunArgs),
    /// Create the data directory and generate a signing key.
    Init(InitArgs),
    /// Print the witness hash of some account input and exit.
    Hash(HashArgs),
    /// Print version information and exit.
    Version,
}

/// Log output format.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable output. Suitable for local development.
    Pretty,
    /// JSON lines. Suitable for log aggregation.
    Json,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Data directory holding the database and the signing key.
    #[arg(long, short = 'd', env = "AGEWITNESS_DATA_DIR", default_value = ".agewitness")]
    pub data_dir: PathBuf,

    /// Port for the JSON API.
    #[arg(long, env = "AGEWITNESS_API_PORT", default_value_t = DEFAULT_API_PORT)]
    pub api_port: u16,

    /// Port for the Prometheus metrics endpoint.
    #[arg(long, env = "AGEWITNESS_METRICS_PORT", default_value_t = DEFAULT_METRICS_PORT)]
    pub metrics_port: u16,

    /// JSON file overriding the release date and fade-in boundaries.
    #[arg(long, short = 'p', env = "AGEWITNESS_POLICY")]
    pub policy: Option<PathBuf>,

    /// Hex-encoded Ed25519 signing key. Read from the data directory when
    /// omitted.
    #[arg(long, env = "AGEWITNESS_SIGNING_KEY", hide_env_values = true)]
    pub signing_key: Option<String>,

    /// Log output format.
    #[arg(long, env = "AGEWITNESS_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

/// Arguments for the `init` subcommand.
#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Data directory to initialize.
    #[arg(long, short = 'd', env = "AGEWITNESS_DATA_DIR", default_value = ".agewitness")]
    pub data_dir: PathBuf,

    /// Overwrite an existing signing key.
    #[arg(long)]
    pub force: bool,
}

/// Arguments for the `hash` subcommand.
#[derive(Parser, Debug)]
pub struct HashArgs {
    /// Account witness input. UTF-8 text unless `--hex` is given.
    pub input: String,

    /// Treat the input as hex-encoded bytes.
    #[arg(long)]
    pub hex: bool,
}
