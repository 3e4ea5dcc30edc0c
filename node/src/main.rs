// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # TIP-3 Root Node
//!
//! Entry point for the `tip3-node` binary. Parses CLI arguments, installs
//! logging, then runs one of four subcommands:
//!
//! - `init`    — generate the owner key, store the wallet code, write `root.json`
//! - `run`     — boot the root and serve the API and metrics endpoints
//! - `status`  — query a running node's status endpoint
//! - `version` — print build version information

mod api;
mod cli;
mod config;
mod logging;
mod metrics;
mod runtime;
mod wallets;

use anyhow::{bail, Context, Result};
use clap::Parser;
use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;
use std::path::Path;
use std::sync::Arc;
use tokio::signal;

use tip3_contracts::InitParams;
use tip3_protocol::config::PROTOCOL_VERSION;
use tip3_protocol::storage::LedgerDb;
use tip3_protocol::{
    derive_root_address, CodeBlob, OwnerCredential, PublicKey, TemplatePin, TemplateStore,
    TokenMetadata,
};

use cli::{Commands, Tip3NodeCli};
use config::{NodeConfig, CONFIG_FILE, OWNER_KEY_FILE};
use metrics::NodeMetrics;
use runtime::{system_clock, Runtime, RuntimeHandle};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Tip3NodeCli::parse();
    logging::init_logging(logging::default_filter(cli.verbose), cli.log_format);

    match cli.command {
        Commands::Init(args) => init_node(args),
        Commands::Run(args) => run_node(args).await,
        Commands::Status(args) => query_status(args).await,
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Boots the root from its data directory and serves the API and metrics
/// endpoints until a shutdown signal arrives.
async fn run_node(args: cli::RunArgs) -> Result<()> {
    let mut config = NodeConfig::load(&args.data_dir)?;
    if let Some(port) = args.rpc_port {
        config.rpc_port = port;
    }
    if let Some(port) = args.metrics_port {
        config.metrics_port = port;
    }

    tracing::info!(
        address = %config.address,
        rpc_port = config.rpc_port,
        metrics_port = config.metrics_port,
        data_dir = %args.data_dir.display(),
        "starting tip3-node"
    );

    // --- Storage ---
    let db_path = NodeConfig::db_path(&args.data_dir);
    let db = LedgerDb::open(&db_path)
        .with_context(|| format!("failed to open database at {}", db_path.display()))?;

    // --- Metrics ---
    let node_metrics = Arc::new(NodeMetrics::new().context("failed to create metrics registry")?);

    // --- Root ---
    let runtime = Runtime::boot(&config, db.clone(), Arc::clone(&node_metrics), system_clock())
        .context("failed to boot the root")?;
    let (handle, runtime_task) = RuntimeHandle::spawn(runtime);

    let app_state = api::AppState {
        version: format!("{} (protocol {})", env!("CARGO_PKG_VERSION"), PROTOCOL_VERSION),
        runtime: handle,
        started_at: chrono::Utc::now(),
    };

    // --- API server ---
    let api_router = api::create_router(app_state);
    let api_addr = format!("0.0.0.0:{}", config.rpc_port);
    let api_listener = tokio::net::TcpListener::bind(&api_addr)
        .await
        .with_context(|| format!("failed to bind RPC listener on {api_addr}"))?;
    tracing::info!(addr = %api_addr, "RPC/API server listening");

    // --- Metrics server ---
    let metrics_router = axum::Router::new()
        .route("/metrics", axum::routing::get(metrics::metrics_handler))
        .with_state(Arc::clone(&node_metrics));
    let metrics_addr = format!("0.0.0.0:{}", config.metrics_port);
    let metrics_listener = tokio::net::TcpListener::bind(&metrics_addr)
        .await
        .with_context(|| format!("failed to bind metrics listener on {metrics_addr}"))?;
    tracing::info!(addr = %metrics_addr, "metrics server listening");

    // --- Serve ---
    tokio::select! {
        res = axum::serve(api_listener, api_router) => {
            if let Err(e) = res {
                tracing::error!(error = %e, "API server error");
            }
        }
        res = axum::serve(metrics_listener, metrics_router) => {
            if let Err(e) = res {
                tracing::error!(error = %e, "metrics server error");
            }
        }
        _ = shutdown_signal() => {
            tracing::info!("shutdown signal received");
        }
    }

    // Steps are synchronous, so aborting never splits one.
    runtime_task.abort();
    db.flush().context("failed to flush database")?;
    tracing::info!("tip3-node stopped");
    Ok(())
}

/// Creates a data directory: owner key, wallet template, `root.json`.
fn init_node(args: cli::InitArgs) -> Result<()> {
    let data_dir = &args.data_dir;
    if data_dir.join(CONFIG_FILE).exists() {
        bail!("{} already holds a {CONFIG_FILE}", data_dir.display());
    }
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("failed to create data directory: {}", data_dir.display()))?;

    let wallet_code = CodeBlob::new(
        std::fs::read(&args.wallet_code)
            .with_context(|| format!("failed to read wallet code {}", args.wallet_code.display()))?,
    );
    if wallet_code.is_empty() {
        bail!("wallet code {} is empty", args.wallet_code.display());
    }

    let eth_root = match &args.eth_root {
        Some(hex_root) => parse_eth_root(hex_root)?,
        None => [0u8; 32],
    };

    // Key-owned roots get a fresh owner key; account-owned roots need none.
    let root_pubkey = match args.owner {
        Some(_) => PublicKey::ZERO,
        None => {
            let key = SigningKey::generate(&mut OsRng);
            write_owner_key(data_dir, &key)?;
            PublicKey::from_bytes(key.verifying_key().to_bytes())
        }
    };
    let owner = OwnerCredential::from_parts(root_pubkey, args.owner)
        .context("invalid owner credential")?;

    let db_path = NodeConfig::db_path(data_dir);
    let db = LedgerDb::open(&db_path)
        .with_context(|| format!("failed to open database at {}", db_path.display()))?;
    let code_hash = db.put(&wallet_code).context("failed to store wallet code")?;
    db.flush().context("failed to flush database")?;

    let metadata = TokenMetadata::new(args.name, args.symbol, args.decimals);
    let logic_hash = CodeBlob::new(format!("tip3-root/{PROTOCOL_VERSION}").into_bytes()).hash();
    let address = derive_root_address(&logic_hash, &metadata, &owner, args.workchain);
    let (rpc_port, metrics_port) = cli::default_ports();

    let config = NodeConfig {
        address,
        logic_hash,
        wallet_pin: TemplatePin::new(code_hash),
        install_template: !args.defer_template,
        params: InitParams {
            metadata,
            root_pubkey: owner.root_pubkey(),
            root_owner: owner.root_owner(),
            total_supply: args.total_supply,
            checker: args.checker,
            receiver: args.receiver,
            eth_root,
            old_root: args.old_root,
            new_root: None,
            trusted: args.trusted,
            wallet_code: None,
        },
        initial_balance: args.initial_balance,
        accounts: args.account_keys,
        rpc_port,
        metrics_port,
    };
    config.save(data_dir)?;

    tracing::info!(address = %address, wallet_code = %code_hash, "root initialized");

    println!("Root initialized successfully.");
    println!("  Data directory : {}", data_dir.display());
    println!("  Root address   : {address}");
    println!("  Wallet code    : {code_hash}");
    match owner.root_owner() {
        Some(account) => println!("  Owner account  : {account}"),
        None => {
            println!("  Owner key      : {}", data_dir.join(OWNER_KEY_FILE).display());
            println!("  Owner pubkey   : {}", owner.root_pubkey().to_hex());
        }
    }
    Ok(())
}

fn parse_eth_root(s: &str) -> Result<[u8; 32]> {
    let bytes = hex::decode(s.strip_prefix("0x").unwrap_or(s)).context("eth root must be hex")?;
    bytes
        .as_slice()
        .try_into()
        .map_err(|_| anyhow::anyhow!("eth root must be 32 bytes, got {}", bytes.len()))
}

fn write_owner_key(data_dir: &Path, key: &SigningKey) -> Result<()> {
    let key_path = data_dir.join(OWNER_KEY_FILE);
    std::fs::write(&key_path, hex::encode(key.to_bytes()))
        .with_context(|| format!("failed to write owner key to {}", key_path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&key_path, std::fs::Permissions::from_mode(0o600))?;
    }
    Ok(())
}

/// Queries a running node's status endpoint and prints the result.
async fn query_status(args: cli::StatusArgs) -> Result<()> {
    let url = format!("{}/status", args.rpc_url.trim_end_matches('/'));
    let body = http_get(&url).await?;
    println!("{body}");
    Ok(())
}

/// Minimal HTTP/1.1 GET over a tokio TCP stream; the node has no HTTP
/// client dependency.
async fn http_get(url: &str) -> Result<String> {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let parsed: url::Url = url.parse().map_err(|e| anyhow::anyhow!("invalid URL: {e}"))?;
    let addr = format!("{}:{}", parsed.host, parsed.port.unwrap_or(80));
    let mut stream = tokio::net::TcpStream::connect(&addr)
        .await
        .with_context(|| format!("failed to connect to {addr}"))?;

    let request = format!(
        "GET {} HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n\r\n",
        parsed.path, parsed.host,
    );
    stream.write_all(request.as_bytes()).await?;
    stream.shutdown().await?;

    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await?;
    let response = String::from_utf8_lossy(&buf);

    // Everything after the first blank line is the body.
    Ok(response
        .split_once("\r\n\r\n")
        .map(|(_, b)| b.to_string())
        .unwrap_or_else(|| response.to_string()))
}

/// Prints version information to stdout.
fn print_version() {
    println!("tip3-node {}", env!("CARGO_PKG_VERSION"));
    println!("protocol  {PROTOCOL_VERSION}");
    println!("rustc     {}", option_env!("RUSTC_VERSION").unwrap_or("unknown"));
}

/// Waits for SIGINT (Ctrl+C) or SIGTERM, whichever comes first.
///
/// On non-Unix platforms, only Ctrl+C is supported.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
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
                tracing::error!(error = %e, "failed to install SIGTERM handler");
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

/// Just enough URL parsing to split host, port and path.
mod url {
    pub struct Url {
        pub host: String,
        pub port: Option<u16>,
        pub path: String,
    }

    impl std::str::FromStr for Url {
        type Err = String;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            if s.starts_with("https://") {
                return Err("https is not supported".into());
            }
            let rest = s.strip_prefix("http://").unwrap_or(s);

            let (authority, path) = match rest.find('/') {
                Some(i) => (&rest[..i], &rest[i..]),
                None => (rest, "/"),
            };

            let (host, port) = match authority.rfind(':') {
                Some(i) => {
                    let p = authority[i + 1..]
                        .parse::<u16>()
                        .map_err(|e| format!("bad port: {e}"))?;
                    (authority[..i].to_string(), Some(p))
                }
                None => (authority.to_string(), None),
            };
            if host.is_empty() {
                return Err("missing host".into());
            }

            Ok(Url {
                host,
                port,
                path: path.to_string(),
            })
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eth_root_accepts_prefixed_hex() {
        let hex_root = format!("0x{}", "ab".repeat(32));
        assert_eq!(parse_eth_root(&hex_root).unwrap(), [0xAB; 32]);
        assert!(parse_eth_root("abcd").is_err());
    }

    #[test]
    fn owner_key_file_is_private() {
        let dir = tempfile::tempdir().unwrap();
        let key = SigningKey::from_bytes(&[3u8; 32]);
        write_owner_key(dir.path(), &key).unwrap();

        let stored = std::fs::read_to_string(dir.path().join(OWNER_KEY_FILE)).unwrap();
        assert_eq!(stored, hex::encode([3u8; 32]));
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(dir.path().join(OWNER_KEY_FILE))
                .unwrap()
                .permissions()
                .mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }
}
