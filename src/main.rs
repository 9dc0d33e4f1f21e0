//! trustseal - document notarization server

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use trustseal::evidence::blockchain::{
    BlockchainConfigBuilder, BlockchainEnvironment, KeySource, LedgerClientFactory,
    LedgerCredentials, LedgerTiming, WalletManager,
};
use trustseal::logger::{self, LogLevel};
use trustseal::notarization::{NotarizationService, RetryPolicy, ServiceSettings};
use trustseal::repository::{
    FilePendingRepository, InMemoryPendingRepository, PendingTransactionRepository,
};
use trustseal::server::{self, AppState, DEFAULT_BODY_LIMIT};
use trustseal::TrustSealResult;

// Not Debug: carries the private key
#[derive(Parser)]
#[command(name = "trustseal")]
#[command(about = "Anchors document digests on an EVM ledger", version)]
struct Args {
    /// Host to bind to
    #[arg(long, env = "TRUSTSEAL_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port to bind to
    #[arg(long, env = "TRUSTSEAL_PORT", default_value = "5000")]
    port: u16,

    /// Ledger environment: mock, testnet or mainnet
    #[arg(long, env = "TRUSTSEAL_ENVIRONMENT", default_value = "mock", value_parser = parse_environment)]
    environment: BlockchainEnvironment,

    /// Chain preset (80002 Polygon Amoy, 11155111 Sepolia, 137 Polygon, 1 Ethereum)
    #[arg(long, env = "TRUSTSEAL_CHAIN_ID", default_value = "80002")]
    chain_id: u64,

    /// Override the preset's JSON-RPC endpoint
    #[arg(long, env = "TRUSTSEAL_RPC_URL")]
    rpc_url: Option<String>,

    /// Deployed notary contract address
    #[arg(long, env = "TRUSTSEAL_CONTRACT_ADDRESS")]
    contract_address: Option<String>,

    /// Override the preset's block explorer base URL
    #[arg(long, env = "TRUSTSEAL_EXPLORER_URL")]
    explorer_url: Option<String>,

    /// Expected signer address, checked against the loaded key
    #[arg(long, env = "TRUSTSEAL_WALLET_ADDRESS")]
    wallet_address: Option<String>,

    /// Hex private key of the signer
    #[arg(long, env = "TRUSTSEAL_PRIVATE_KEY", hide = true, hide_env_values = true)]
    private_key: Option<String>,

    /// File holding the hex private key of the signer
    #[arg(long, env = "TRUSTSEAL_PRIVATE_KEY_FILE", conflicts_with = "private_key")]
    private_key_file: Option<PathBuf>,

    /// Seconds to wait for inclusion before answering "pending"
    #[arg(long, env = "TRUSTSEAL_CONFIRMATION_TIMEOUT_SECS", default_value = "60")]
    confirmation_timeout_secs: u64,

    /// Timeout per JSON-RPC call in milliseconds
    #[arg(long, env = "TRUSTSEAL_RPC_TIMEOUT_MS", default_value = "10000")]
    rpc_timeout_ms: u64,

    /// Receipt polling interval in milliseconds
    #[arg(long, env = "TRUSTSEAL_POLL_INTERVAL_MS", default_value = "2000")]
    poll_interval_ms: u64,

    /// Blocks required before a transaction counts as confirmed
    #[arg(long, env = "TRUSTSEAL_CONFIRMATIONS", default_value = "1")]
    confirmations: u64,

    /// Attempts for retryable ledger calls
    #[arg(long, env = "TRUSTSEAL_RETRY_ATTEMPTS", default_value = "3")]
    retry_attempts: u32,

    /// Maximum serialized metadata size in bytes
    #[arg(long, env = "TRUSTSEAL_MAX_PAYLOAD_BYTES", default_value = "16384")]
    max_payload_bytes: usize,

    /// Maximum HTTP request body size in bytes
    #[arg(long, env = "TRUSTSEAL_BODY_LIMIT_BYTES", default_value_t = DEFAULT_BODY_LIMIT)]
    body_limit_bytes: usize,

    /// JSON file tracking unconfirmed transactions (in memory if unset)
    #[arg(long, env = "TRUSTSEAL_PENDING_STORE")]
    pending_store: Option<PathBuf>,

    /// Seconds between reconciliation passes (0 disables)
    #[arg(long, env = "TRUSTSEAL_RECONCILE_INTERVAL_SECS", default_value = "30")]
    reconcile_interval_secs: u64,

    /// Seconds before a signed transaction the ledger never saw is dropped from tracking
    #[arg(long, env = "TRUSTSEAL_ABANDON_AFTER_SECS", default_value = "600")]
    abandon_after_secs: u64,

    /// Log level
    #[arg(long, env = "TRUSTSEAL_LOG_LEVEL", default_value = "info", value_parser = parse_log_level)]
    log_level: LogLevel,
}

fn parse_environment(value: &str) -> Result<BlockchainEnvironment, String> {
    BlockchainEnvironment::from_str(value)
        .ok_or_else(|| format!("unknown environment '{}' (mock, testnet, mainnet)", value))
}

fn parse_log_level(value: &str) -> Result<LogLevel, String> {
    LogLevel::from_str(value).ok_or_else(|| format!("unknown log level '{}'", value))
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(e) = logger::init(args.log_level) {
        eprintln!("{}", e);
        return ExitCode::FAILURE;
    }

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(kind = e.error_kind(), error = %e, "trustseal failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> TrustSealResult<()> {
    info!("Starting trustseal v{}", env!("CARGO_PKG_VERSION"));

    let mut builder = BlockchainConfigBuilder::new()
        .environment(args.environment)
        .chain_id(args.chain_id)?
        .timing(LedgerTiming {
            rpc_timeout_ms: args.rpc_timeout_ms,
            poll_interval_ms: args.poll_interval_ms,
            confirmations: args.confirmations,
        })
        .max_payload_bytes(args.max_payload_bytes);
    if let Some(url) = args.rpc_url {
        builder = builder.rpc_url(url);
    }
    if let Some(address) = args.contract_address {
        builder = builder.contract_address(address);
    }
    if let Some(url) = args.explorer_url {
        builder = builder.explorer_url(url);
    }
    if let Some(address) = args.wallet_address {
        builder = builder.wallet_address(address);
    }
    let config = builder.build()?;

    let credentials = load_credentials(args.private_key, args.private_key_file)?;
    if let Some(credentials) = &credentials {
        info!(address = %credentials.address_hex(), "Signer loaded");
    }

    let ledger = LedgerClientFactory::create(&config, credentials)?;
    if !ledger.is_connected().await {
        warn!(network = %ledger.network_name(), "Ledger not reachable at startup");
    }

    let pending: Arc<dyn PendingTransactionRepository> = match &args.pending_store {
        Some(path) => {
            info!(path = %path.display(), "Tracking pending transactions on disk");
            Arc::new(FilePendingRepository::new(path)?)
        }
        None => Arc::new(InMemoryPendingRepository::new()),
    };

    let settings = ServiceSettings {
        confirmation_timeout: Duration::from_secs(args.confirmation_timeout_secs),
        retry: RetryPolicy {
            max_attempts: args.retry_attempts,
            ..RetryPolicy::default()
        }
        .with_rpc_timeout(Duration::from_millis(args.rpc_timeout_ms)),
        abandon_after: Duration::from_secs(args.abandon_after_secs),
    };
    let service = NotarizationService::new(ledger, pending, settings);

    if args.reconcile_interval_secs > 0 {
        spawn_reconciler(
            service.clone(),
            Duration::from_secs(args.reconcile_interval_secs),
        );
    }

    let router = server::create_router(AppState::new(service), args.body_limit_bytes);
    let listener = server::bind(&args.host, args.port).await?;
    server::serve(listener, router, server::shutdown_signal()).await
}

fn load_credentials(
    private_key: Option<String>,
    private_key_file: Option<PathBuf>,
) -> TrustSealResult<Option<LedgerCredentials>> {
    let source = match (private_key, private_key_file) {
        (Some(key), _) => KeySource::Inline(key),
        (None, Some(path)) => KeySource::File(path),
        (None, None) => return Ok(None),
    };
    WalletManager::load(&source).map(Some)
}

fn spawn_reconciler(service: NotarizationService, every: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(e) = service.reconcile_pending().await {
                warn!(error = %e, "Reconciliation pass failed");
            }
        }
    });
}
