use salesplit::engine::AttributionConfig;
use salesplit::orchestration::{Collaborators, TransactionContextAggregator};
use salesplit::{
    api, config::Config, db::init_db, CallTraceDeltaComputer, Orchestrator, Repository,
    RoyaltyAttributor, RpcTraceProvider,
};
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let port = config.port;

    let pool = match init_db(&config.database_path).await {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Failed to initialize database: {}", e);
            std::process::exit(1);
        }
    };

    let repo = Arc::new(Repository::new(pool));
    let balances = CallTraceDeltaComputer::new(config.wrapped_native_contract)
        .with_fungible_contracts(config.fungible_token_contracts.iter().cloned());

    let aggregator = TransactionContextAggregator::new(Collaborators {
        traces: Arc::new(RpcTraceProvider::new(config.rpc_url.clone())),
        fills: repo.clone(),
        balances: Arc::new(balances),
        royalties: repo.clone(),
    });
    let attributor = RoyaltyAttributor::new(aggregator, AttributionConfig::from(&config));
    let orchestrator = Arc::new(Orchestrator::new(attributor, repo.clone()));

    tracing::info!(
        fee_recipients = config.marketplace_fee_recipients.len(),
        wrapped_native = %config.wrapped_native_contract,
        missing_royalty_threshold_bps = config.missing_royalty_threshold_bps,
        "Attribution engine configured"
    );

    let app = api::create_router(api::AppState::new(repo, orchestrator));

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    tracing::info!("Server listening on {}", addr);

    if let Err(e) = axum::serve(listener, app).await {
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    }
}
