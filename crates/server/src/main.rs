use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reseed_core::jobs::{
    CleanupJob, CollisionRecheckJob, Job, JobName, JobScheduler, CLEANUP_CADENCE,
    COLLISION_RECHECK_CADENCE,
};
use reseed_core::store::{
    ClientSearcheeStore, ConflictRuleStore, Database, DecisionStore, IndexerStore, JobLogStore,
};
use reseed_core::{create_authenticator, load_config, validate_config, GuidInfoHashMap, TorrentCache};

use reseed_server::{create_router, AppState};

const SCHEDULER_TICK: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = std::env::var("RESEED_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;
    validate_config(&config).context("Configuration validation failed")?;
    info!("Configuration loaded successfully");

    let db = Database::open(&config.database.path)
        .with_context(|| format!("Failed to open database at {:?}", config.database.path))?;
    let decisions = DecisionStore::new(db.clone());
    let rules = ConflictRuleStore::new(db.clone());
    let indexers = IndexerStore::new(db.clone());
    let clients = ClientSearcheeStore::new(db.clone());

    let cache = TorrentCache::new(&config.app_dir).context("Failed to create torrent cache")?;

    // Rebuild the guid correlation map from the decision table.
    let guid_map = Arc::new(GuidInfoHashMap::new());
    let pairs = decisions
        .guid_info_hash_pairs()
        .context("Failed to read decision history")?;
    let rebuilt = pairs.len();
    guid_map.rebuild(pairs).await;
    info!("Rebuilt guid correlation map ({} entries)", rebuilt);

    let authenticator: Arc<dyn reseed_core::Authenticator> =
        Arc::from(create_authenticator(&config.auth));
    info!("Auth method: {}", authenticator.method_name());

    // Scheduler: housekeeping jobs. Search-driven jobs (RSS, SEARCH,
    // INJECT, UPDATE_INDEXER_CAPS) register here once their collaborators
    // are configured.
    let mut scheduler = JobScheduler::new(JobLogStore::new(db.clone()), SCHEDULER_TICK);
    scheduler.register(Job::new(
        JobName::Cleanup,
        CLEANUP_CADENCE,
        Arc::new(CleanupJob::new(decisions.clone(), cache.clone())),
    ));
    let state = AppState::new(
        config.clone(),
        authenticator,
        decisions.clone(),
        rules,
        indexers,
        clients,
        None,
    );
    if let Some(searcher) = state.bulk_searcher() {
        let use_client_torrents = config.jobs.use_client_torrents;
        scheduler.register(
            Job::new(
                JobName::CollisionRecheck,
                COLLISION_RECHECK_CADENCE,
                Arc::new(CollisionRecheckJob::new(decisions.clone(), Arc::clone(searcher))),
            )
            .with_should_run(move || use_client_torrents),
        );
    }
    let scheduler = Arc::new(scheduler);
    scheduler.start();

    let app = create_router(Arc::new(state));
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("Server error")?;

    scheduler.stop();
    Ok(())
}
