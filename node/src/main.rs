// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Account Age Witness Node
//!
//! Entry point for the `agewitness-node` binary. Parses CLI arguments,
//! initializes logging and metrics, seeds the witness store from the local
//! database, and serves the HTTP API.
//!
//! The binary supports four subcommands:
//!
//! - `run`     — start the node
//! - `init`    — initialize the data directory and generate a signing key
//! - `hash`    — print the witness hash of an account input
//! - `version` — print build version information

mod api;
mod cli;
mod logging;
mod metrics;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use tokio::signal;

use agewitness_protocol::config::{PolicyConfig, PROTOCOL_VERSION, WITNESS_HASH_FUNCTION};
use agewitness_protocol::crypto::SigningKeypair;
use agewitness_protocol::identity::{KeyRing, LocalKeyRing};
use agewitness_protocol::network::bootstrap;
use agewitness_protocol::storage::WitnessDb;
use agewitness_protocol::witness::{derive_hash, WitnessStore};

use cli::{AgeWitnessCli, Commands, LogFormat, SIGNING_KEY_FILE};
use metrics::WitnessMetrics;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = AgeWitnessCli::parse();

    match cli.command {
        Commands::Run(args) => run_node(args).await,
        Commands::Init(args) => init_node(args),
        Commands::Hash(args) => print_hash(args),
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Starts the node: database, witness feed, API server and metrics endpoint.
async fn run_node(args: cli::RunArgs) -> Result<()> {
    logging::init_logging(logging::DEFAULT_FILTER, args.log_format);

    tracing::info!(
        api_port = args.api_port,
        metrics_port = args.metrics_port,
        data_dir = %args.data_dir.display(),
        "starting agewitness-node"
    );

    // --- Policy ---
    let policy = match &args.policy {
        Some(path) => load_policy(path)?,
        None => PolicyConfig::default(),
    };
    tracing::info!(
        release_date_ms = policy.release_date_ms,
        fade_in_boundaries_ms = ?policy.fade_in_boundaries_ms,
        "policy loaded"
    );

    // --- Identity ---
    let keypair = load_signing_key(args.signing_key.as_deref(), &args.data_dir)?;
    let key_ring = Arc::new(LocalKeyRing::new(keypair));
    tracing::info!(identity = %key_ring.identity_hash(), "signing identity loaded");

    // --- Persistent storage ---
    let db_path = args.data_dir.join("db");
    std::fs::create_dir_all(&db_path)
        .with_context(|| format!("failed to create database directory: {}", db_path.display()))?;
    let db = Arc::new(
        WitnessDb::open(&db_path)
            .with_context(|| format!("failed to open database at {}", db_path.display()))?,
    );
    tracing::info!(path = %db_path.display(), "database opened");

    // --- Witness store + feed ---
    let store = Arc::new(WitnessStore::new());
    let (loaded, feed) = bootstrap(Arc::clone(&store), Arc::clone(&db))
        .context("failed to seed witness store from database")?;
    tracing::info!(loaded, "witness store ready");

    // --- Metrics ---
    let node_metrics = Arc::new(WitnessMetrics::new().context("failed to register metrics")?);

    // --- Application state ---
    let app_state = api::AppState::new(
        format!(
            "{} (protocol {})",
            env!("CARGO_PKG_VERSION"),
            PROTOCOL_VERSION
        ),
        Arc::clone(&store),
        key_ring,
        Arc::clone(&db),
        &policy,
        node_metrics,
    );

    // --- API server ---
    let api_router = api::create_router(app_state.clone());
    let api_addr = format!("0.0.0.0:{}", args.api_port);
    let api_listener = tokio::net::TcpListener::bind(&api_addr)
        .await
        .with_context(|| format!("failed to bind API listener on {}", api_addr))?;
    tracing::info!("API server listening on {}", api_addr);

    // --- Metrics server ---
    let metrics_router = axum::Router::new()
        .route("/metrics", axum::routing::get(metrics::metrics_handler))
        .with_state(app_state);
    let metrics_addr = format!("0.0.0.0:{}", args.metrics_port);
    let metrics_listener = tokio::net::TcpListener::bind(&metrics_addr)
        .await
        .with_context(|| format!("failed to bind metrics listener on {}", metrics_addr))?;
    tracing::info!("Metrics server listening on {}", metrics_addr);

    // --- Serve ---
    tokio::select! {
        res = axum::serve(api_listener, api_router) => {
            if let Err(e) = res {
                tracing::error!("API server error: {}", e);
            }
        }
        res = axum::serve(metrics_listener, metrics_router) => {
            if let Err(e) = res {
                tracing::error!("Metrics server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            tracing::info!("shutdown signal received");
        }
    }

    feed.abort();
    db.flush().context("failed to flush database")?;
    tracing::info!("agewitness-node stopped");
    Ok(())
}

/// Reads and validates a JSON policy file.
fn load_policy(path: &Path) -> Result<PolicyConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read policy file {}", path.display()))?;
    PolicyConfig::from_json_str(&raw)
        .with_context(|| format!("invalid policy file {}", path.display()))
}

/// Signing key from the explicit hex argument, else from the data directory.
fn load_signing_key(explicit: Option<&str>, data_dir: &Path) -> Result<SigningKeypair> {
    if let Some(hex_key) = explicit {
        return SigningKeypair::from_hex(hex_key.trim()).context("invalid --signing-key");
    }
    let key_path = data_dir.join(SIGNING_KEY_FILE);
    let raw = std::fs::read_to_string(&key_path).with_context(|| {
        format!(
            "failed to read signing key {} (run `agewitness-node init` first)",
            key_path.display()
        )
    })?;
    SigningKeypair::from_hex(raw.trim())
        .with_context(|| format!("invalid signing key in {}", key_path.display()))
}

/// Initializes a new data directory and generates a signing keypair.
fn init_node(args: cli::InitArgs) -> Result<()> {
    logging::init_logging("agewitness_node=info", LogFormat::Pretty);

    let data_dir = &args.data_dir;
    tracing::info!(data_dir = %data_dir.display(), "initializing node");

    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("failed to create data directory: {}", data_dir.display()))?;

    let key_path = data_dir.join(SIGNING_KEY_FILE);
    if key_path.exists() && !args.force {
        anyhow::bail!(
            "signing key already exists at {} (use --force to replace it)",
            key_path.display()
        );
    }

    let keypair = SigningKeypair::generate();
    let public_key = keypair.public_key();
    write_secret_key(&key_path, &hex::encode(keypair.secret_key_bytes()))
        .with_context(|| format!("failed to write signing key to {}", key_path.display()))?;

    tracing::info!(
        public_key = %public_key.to_hex(),
        key_path = %key_path.display(),
        "signing keypair generated"
    );

    println!("Node initialized successfully.");
    println!("  Data directory : {}", data_dir.display());
    println!("  Signing key    : {}", key_path.display());
    println!("  Public key     : {}", public_key.to_hex());
    println!("  Identity hash  : {}", public_key.identity_hash());

    Ok(())
}

/// Writes a secret key file readable only by the owner.
///
/// On Unix the file is created with mode 0600, so the key is never on disk
/// with looser permissions. A replaced key file is tightened as well.
fn write_secret_key(path: &Path, contents: &str) -> std::io::Result<()> {
    use std::io::Write;

    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(contents.as_bytes())?;
    file.sync_all()
}

/// Prints the witness hash of a CLI-supplied account input.
fn print_hash(args: cli::HashArgs) -> Result<()> {
    let input = if args.hex {
        hex::decode(args.input.trim()).context("input is not valid hex")?
    } else {
        args.input.into_bytes()
    };
    println!("{}", derive_hash(&input));
    Ok(())
}

/// Prints version information to stdout.
fn print_version() {
    println!("agewitness-node {}", env!("CARGO_PKG_VERSION"));
    println!("protocol        {}", PROTOCOL_VERSION);
    println!("witness hash    {}", WITNESS_HASH_FUNCTION);
}

/// Waits for SIGINT (Ctrl+C) or SIGTERM, whichever comes first.
///
/// On non-Unix platforms, only Ctrl+C is supported. If a handler cannot be
/// installed, that signal source is ignored.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signing_key_round_trips_through_data_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let keypair = SigningKeypair::generate();
        std::fs::write(
            dir.path().join(SIGNING_KEY_FILE),
            format!("{}\n", hex::encode(keypair.secret_key_bytes())),
        )
        .unwrap();

        let loaded = load_signing_key(None, dir.path()).unwrap();
        assert_eq!(loaded.public_key(), keypair.public_key());
    }

    #[test]
    fn explicit_signing_key_wins() {
        let dir = tempfile::tempdir().expect("tempdir");
        let keypair = SigningKeypair::generate();
        let hex_key = hex::encode(keypair.secret_key_bytes());

        let loaded = load_signing_key(Some(&hex_key), dir.path()).unwrap();
        assert_eq!(loaded.public_key(), keypair.public_key());
    }

    #[test]
    fn missing_signing_key_mentions_init() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = load_signing_key(None, dir.path()).unwrap_err();
        assert!(format!("{err:#}").contains("agewitness-node init"));
    }

    #[test]
    fn secret_key_file_is_private_from_creation() {
        let dir = tempfile::tempdir().expect("tempdir");
        let key_path = dir.path().join(SIGNING_KEY_FILE);
        let keypair = SigningKeypair::generate();

        write_secret_key(&key_path, &hex::encode(keypair.secret_key_bytes())).unwrap();

        let loaded = load_signing_key(None, dir.path()).unwrap();
        assert_eq!(loaded.public_key(), keypair.public_key());
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&key_path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[cfg(unix)]
    #[test]
    fn replaced_secret_key_file_is_tightened() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("tempdir");
        let key_path = dir.path().join(SIGNING_KEY_FILE);
        std::fs::write(&key_path, "old").unwrap();
        std::fs::set_permissions(&key_path, std::fs::Permissions::from_mode(0o644)).unwrap();

        write_secret_key(&key_path, "new").unwrap();

        assert_eq!(std::fs::read_to_string(&key_path).unwrap(), "new");
        let mode = std::fs::metadata(&key_path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn policy_file_is_validated() {
        let dir = tempfile::tempdir().expect("tempdir");
        let good = dir.path().join("good.json");
        std::fs::write(&good, r#"{"release_date_ms": 5}"#).unwrap();
        assert_eq!(load_policy(&good).unwrap().release_date_ms, 5);

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, r#"{"fade_in_boundaries_ms": [3, 2, 1]}"#).unwrap();
        assert!(load_policy(&bad).is_err());
    }
}
