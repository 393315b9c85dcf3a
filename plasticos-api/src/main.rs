//! PlasticOS API server entry point.
//!
//! Bootstraps `PlasticConfig` from the environment, builds the Postgres +
//! property-graph hybrid hypergraph store, spawns the background graph
//! projection worker and its periodic reconciliation pass, wires the World
//! Model, Reasoning Block Registry, Research DAG, and Matching Engine
//! against it, and serves the Axum router.

use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::Method;
use axum::middleware::{self, Next};
use axum::response::IntoResponse;
use axum::Router;
use governor::{clock::DefaultClock, Quota, RateLimiter};
use plasticos_api::{create_api_router, ApiConfig, ApiError, AppState};
use plasticos_core::PlasticConfig;
use plasticos_llm::providers::stub::{StubEmbeddingProvider, StubSummarizationProvider};
use plasticos_llm::providers::{build_research_client, OpenAIEmbeddingProvider};
use plasticos_llm::{EmbeddingProvider, SummarizationProvider};
use plasticos_matching::{MatchingEngine, MatchingEngineConfig};
use plasticos_pg::graph::GraphProjector;
use plasticos_pg::pool::PgPoolConfig;
use plasticos_pg::projection::ProjectionWorker;
use plasticos_pg::schema::apply_migrations;
use plasticos_pg::store::PgColdStore;
use plasticos_reasoning::BlockRegistry;
use plasticos_research::{PipelineConfig, ResearchPipeline};
use plasticos_schema::SynonymTable;
use plasticos_storage::cache::{InMemoryChangeJournal, LmdbCacheBackend};
use plasticos_storage::hybrid_store::HybridHypergraphStore;
use plasticos_storage::HypergraphStore;
use plasticos_worldmodel::{ScoringPolicy, WorldModelService};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

type DirectRateLimiter =
    RateLimiter<governor::state::NotKeyed, governor::state::InMemoryState, DefaultClock>;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = PlasticConfig::from_env()?;
    tracing::info!(research_client = %config.research_client_type, "loaded PlasticConfig");

    let pool_config = PgPoolConfig::from_dsn(&config.postgres_dsn)?;
    let pool = pool_config.create_pool()?;
    let applied = apply_migrations(&pool).await?;
    tracing::info!(applied_migrations = applied.len(), "schema up to date");

    let graph = Arc::new(
        GraphProjector::connect(&config.graph_uri, &config.graph_user, &config.graph_password)
            .await?,
    );

    let cold = Arc::new(PgColdStore::new(pool.clone()).with_graph(Arc::clone(&graph)));

    tokio::spawn(ProjectionWorker::new(pool.clone(), Arc::clone(&graph)).run());
    spawn_reconciliation_loop(pool.clone(), Arc::clone(&graph), &config);

    let cache_dir =
        std::env::var("PLASTICOS_LMDB_PATH").unwrap_or_else(|_| "/tmp/plasticos-hot-cache".to_string());
    std::fs::create_dir_all(&cache_dir)?;
    let cache = Arc::new(LmdbCacheBackend::new(&cache_dir, 256)?);
    let journal = Arc::new(InMemoryChangeJournal::new());

    let store: Arc<dyn HypergraphStore> = Arc::new(HybridHypergraphStore::new(cache, journal, cold));

    let world_model = Arc::new(WorldModelService::new(
        ScoringPolicy::default(),
        config.world_model_recompute_every_n_events,
    ));

    let embeddings: Arc<dyn EmbeddingProvider> = if let Some(key) = config.research_client_api_key.clone() {
        Arc::new(OpenAIEmbeddingProvider::new(
            key,
            config.embedding_model.clone(),
            config.embedding_dim,
        ))
    } else {
        Arc::new(StubEmbeddingProvider::new(config.embedding_dim))
    };

    let summarizer: Arc<dyn SummarizationProvider> = Arc::new(StubSummarizationProvider);
    let reasoning = Arc::new(BlockRegistry::with_default_blocks(summarizer));

    let research_client =
        Arc::from(build_research_client(config.research_client_type, config.research_client_api_key.clone())?);

    let pipeline_config = PipelineConfig::from(&config);
    let research = Arc::new(ResearchPipeline::new(
        Arc::clone(&store),
        Arc::clone(&world_model),
        research_client,
        Arc::clone(&reasoning),
        SynonymTable::new(std::iter::empty()),
        pipeline_config,
    ));

    let matching_config = MatchingEngineConfig::from(&config);
    let matching = Arc::new(MatchingEngine::new(
        Arc::clone(&store),
        Arc::clone(&world_model),
        Arc::clone(&embeddings),
        Arc::clone(&reasoning),
        matching_config,
    ));

    let state = AppState {
        store,
        world_model,
        research,
        matching,
        reasoning,
        embeddings,
        start_time: std::time::Instant::now(),
    };

    let api_config = ApiConfig::from_env();
    let app = build_router(state, &api_config);

    let addr = resolve_bind_addr()?;
    tracing::info!(%addr, "starting PlasticOS API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).json().init();
}

fn build_router(state: AppState, api_config: &ApiConfig) -> Router {
    let mut router: Router<AppState> = create_api_router();

    if api_config.rate_limit_enabled {
        let quota = Quota::per_minute(
            NonZeroU32::new(api_config.rate_limit_per_minute.max(1)).unwrap_or(NonZeroU32::MIN),
        )
        .allow_burst(NonZeroU32::new(api_config.rate_limit_burst.max(1)).unwrap_or(NonZeroU32::MIN));
        let limiter: Arc<DirectRateLimiter> = Arc::new(RateLimiter::direct(quota));
        router = router.layer(middleware::from_fn_with_state(limiter, rate_limit_middleware));
    }

    router
        .layer(build_cors_layer(api_config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn rate_limit_middleware(
    State(limiter): State<Arc<DirectRateLimiter>>,
    request: axum::extract::Request,
    next: Next,
) -> axum::response::Response {
    match limiter.check() {
        Ok(_) => next.run(request).await,
        Err(_) => ApiError::too_many_requests().into_response(),
    }
}

fn build_cors_layer(api_config: &ApiConfig) -> CorsLayer {
    let layer = if api_config.cors_origins.is_empty() {
        CorsLayer::new().allow_origin(AllowOrigin::any())
    } else {
        let config = api_config.clone();
        CorsLayer::new().allow_origin(AllowOrigin::predicate(move |origin, _| {
            origin.to_str().map(|o| config.is_origin_allowed(o)).unwrap_or(false)
        }))
    };

    layer
        .allow_methods([Method::GET, Method::POST])
        .allow_credentials(api_config.cors_allow_credentials)
        .max_age(Duration::from_secs(api_config.cors_max_age_secs))
}

/// Periodically repairs stale graph projections (invariant 5's bounded-lag
/// guarantee), independent of the projection worker's queue-draining loop.
fn spawn_reconciliation_loop(pool: deadpool_postgres::Pool, graph: Arc<GraphProjector>, config: &PlasticConfig) {
    let interval = Duration::from_secs(config.reconciliation_interval_seconds);
    tokio::spawn(async move {
        let worker = ProjectionWorker::new(pool, graph);
        loop {
            tokio::time::sleep(interval).await;
            match worker.reconcile().await {
                Ok(repaired) if repaired > 0 => {
                    tracing::info!(repaired, "reconciliation repaired stale graph projections");
                }
                Ok(_) => {}
                Err(e) => tracing::warn!(error = %e, "reconciliation pass failed"),
            }
        }
    });
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}

fn resolve_bind_addr() -> Result<SocketAddr, Box<dyn std::error::Error>> {
    let host = std::env::var("PLASTICOS_API_BIND").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port_str = std::env::var("PORT")
        .ok()
        .or_else(|| std::env::var("PLASTICOS_API_PORT").ok())
        .unwrap_or_else(|| "3000".to_string());
    let port: u16 = port_str.parse()?;
    Ok(format!("{host}:{port}").parse()?)
}
