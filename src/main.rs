use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use quebella_api::{
    auth::{jwt::TokenVerifier, rate_limit::AuthThrottle},
    build_router,
    config::{Config, StoreBackend},
    db::{self, MemoryStore, PgStore, Store},
    services::{
        identity::GoTrueClient,
        llm::{build_generator, GenerationOptions},
        object_store::SupabaseStorage,
        reflection::ReflectionWriter,
        reflection_job::spawn_reflection_worker,
    },
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quebella_api=debug,tower_http=debug".into()),
        )
        .json()
        .init();

    let config = Arc::new(Config::from_env().context("Invalid configuration")?);

    let store: Arc<dyn Store> = match config.store_backend {
        StoreBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL must be set")?;
            let pool = db::pool::create_pool(url)
                .await
                .context("Failed to connect to the database")?;

            if config.run_migrations {
                sqlx::migrate!("./migrations")
                    .run(&pool)
                    .await
                    .context("Failed to run database migrations")?;
                tracing::info!("Database migrations applied");
            }

            Arc::new(PgStore::new(pool))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory store; data is lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    let identity = Arc::new(GoTrueClient::new(
        &config.supabase_url,
        &config.supabase_anon_key,
    )?);
    let objects = Arc::new(SupabaseStorage::new(
        &config.supabase_url,
        &config.supabase_service_role_key,
        &config.audio_bucket,
    )?);

    let reflections = ReflectionWriter::new(
        build_generator(&config)?,
        GenerationOptions {
            max_tokens: config.reflection_max_tokens,
            temperature: config.reflection_temperature,
        },
        Duration::from_secs(config.reflection_timeout_secs),
    );

    let tokens = TokenVerifier::from_config(&config);
    if !tokens.verifies_signatures() {
        tracing::warn!(
            "SUPABASE_JWT_SECRET is not set; bearer tokens are decoded without signature checks"
        );
    }
    if config.cron_secret.is_none() {
        tracing::warn!("CRON_SECRET is not set; the cron endpoint will refuse every call");
    }

    let auth_throttle = AuthThrottle::from_config(&config);
    auth_throttle.spawn_pruning();

    if config.reflection_worker_enabled {
        spawn_reflection_worker(
            store.clone(),
            reflections.clone(),
            config.reflection_sweep_hour_utc,
        );
        tracing::info!(
            hour_utc = config.reflection_sweep_hour_utc,
            "Daily reflection worker started"
        );
    }

    let state = AppState {
        store,
        identity,
        objects,
        reflections,
        tokens,
        auth_throttle,
        config: config.clone(),
    };

    let app = build_router(state);

    let addr = config.listen_addr();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    // connect info feeds the per-IP rate limiter
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
