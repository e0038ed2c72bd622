// src/main.rs

use fair_agent_mcp::{
    api::create_router,
    blockchain::{
        encryption::{RemoteEncryptor, TransactionEncryptor, UnconfiguredEncryptor},
        evm_client::RpcGateway,
        BlockchainClient,
    },
    config::Config,
    mcp::stdio,
    AppState,
};
use secrecy::ExposeSecret;
use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// --- HTTP Server Logic ---
async fn run_http_server(state: AppState) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([127, 0, 0, 1], state.config.port));
    let app = create_router(state);

    info!("🚀 HTTP Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;
    Ok(())
}

// --- MCP Server Logic ---
async fn run_mcp_server(state: AppState) {
    info!("🚀 Starting MCP server on stdin/stdout...");

    let stdin = io::BufReader::new(io::stdin());
    if let Err(e) = stdio::serve(stdin, io::stdout(), state).await {
        error!("MCP transport failed: {}", e);
    }

    info!("MCP server shutting down");
}

fn build_state(config: Config) -> anyhow::Result<AppState> {
    let registry = config.chain_registry()?;
    info!("Loaded {} chains: {}", registry.names().len(), registry.names().join(", "));

    if registry.get(&config.default_chain).is_err() {
        anyhow::bail!("DEFAULT_CHAIN '{}' is not a registered chain", config.default_chain);
    }

    let private_key = config
        .private_key
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("PRIVATE_KEY must be set"))?;
    let gateway = RpcGateway::new(private_key.expose_secret(), config.receipt_policy())?;

    let encryptor: Arc<dyn TransactionEncryptor> = match config.encryption_service_url.as_deref() {
        Some(url) => {
            info!("Transaction encryption via {}", url);
            Arc::new(RemoteEncryptor::new(url))
        }
        None => {
            warn!("ENCRYPTION_SERVICE_URL not set; encrypted transactions will be refused");
            Arc::new(UnconfiguredEncryptor)
        }
    };

    let client = BlockchainClient::new(registry, Arc::new(gateway), encryptor);
    Ok(AppState { config, client })
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fair_agent_mcp=debug,fair_mcp=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("❌ Failed to load configuration: {:#}", e);
            return;
        }
    };

    let app_state = match build_state(config) {
        Ok(state) => state,
        Err(e) => {
            error!("❌ Failed to initialize blockchain client: {:#}", e);
            return;
        }
    };

    info!(
        "Signing as {:?} (encryption mode: {:?})",
        app_state.client.gateway().account(),
        app_state.config.encryption_mode
    );

    // Check if running in MCP mode (stdin/stdout) or HTTP server mode
    let args: Vec<String> = env::args().collect();
    if args.contains(&"--mcp".to_string()) || env::var("MCP_MODE").is_ok() {
        run_mcp_server(app_state).await;
    } else if let Err(e) = run_http_server(app_state).await {
        error!("❌ HTTP server failed: {:#}", e);
    }
}
