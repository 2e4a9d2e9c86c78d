pub mod allocation;
pub mod cache;
pub mod config;
pub mod controllers;
pub mod coordinator;
pub mod error;
pub mod models;
pub mod redis_client;
pub mod store;

use axum::{extract::State, http::StatusCode, routing::get, Router};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::cache::{RedisSeatCache, SeatCache};
use crate::config::{Config, StoreBackend};
use crate::coordinator::ClaimCoordinator;
use crate::store::{MemorySeatStore, PgSeatStore, SeatStore};

// Shared state для всего приложения
#[derive(Clone)]
pub struct AppState {
    pub coordinator: ClaimCoordinator,
    pub cache: Option<Arc<dyn SeatCache>>,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Arc<Self>> {
        let store: Arc<dyn SeatStore> = match config.store.backend {
            StoreBackend::Postgres => {
                let url = config
                    .store
                    .database_url
                    .as_deref()
                    .ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set for the postgres backend"))?;
                let store = PgSeatStore::connect(url, config.store.pool_size).await?;
                info!("Database connected");
                store.run_migrations().await?;
                Arc::new(store)
            }
            StoreBackend::Memory => {
                warn!("Using in-memory seat store, data is lost on restart");
                Arc::new(MemorySeatStore::new())
            }
        };

        let cache: Option<Arc<dyn SeatCache>> = match &config.redis.url {
            Some(url) => {
                let redis = redis_client::RedisClient::new(url).await?;
                info!("Redis connected");
                Some(Arc::new(RedisSeatCache::new(redis, config.redis.seat_cache_ttl_seconds)))
            }
            None => None,
        };

        Ok(Arc::new(Self::from_parts(store, cache, &config)))
    }

    pub fn from_parts(store: Arc<dyn SeatStore>, cache: Option<Arc<dyn SeatCache>>, config: &Config) -> Self {
        let coordinator = ClaimCoordinator::with_retries(store, config.booking.max_claim_retries);
        Self { coordinator, cache }
    }
}

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(|| async { "Cinema Booking API v1.0" }))
        .route("/health", get(health))
        .nest("/api", controllers::routes())
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, &'static str) {
    if let Err(e) = state.coordinator.store().ping().await {
        tracing::error!("Health check failed: {:?}", e);
        return (StatusCode::SERVICE_UNAVAILABLE, "store unavailable");
    }
    if let Some(cache) = &state.cache {
        // кеш не критичен: сбой только логируется внутри ping
        cache.ping().await;
    }
    (StatusCode::OK, "OK")
}
