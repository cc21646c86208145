//! Backend for a shared couples journal: entries, moods, partner linking,
//! read receipts, private notes, and daily AI reflections for each couple.

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

pub mod auth;
pub mod config;
pub mod db;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;

use auth::jwt::TokenVerifier;
use auth::rate_limit::AuthThrottle;
use config::Config;
use db::Store;
use services::identity::IdentityProvider;
use services::object_store::ObjectStore;
use services::reflection::ReflectionWriter;

/// Multipart framing on top of the audio payload itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub identity: Arc<dyn IdentityProvider>,
    pub objects: Arc<dyn ObjectStore>,
    pub reflections: ReflectionWriter,
    pub tokens: TokenVerifier,
    pub auth_throttle: AuthThrottle,
    pub config: Arc<Config>,
}

fn cors_layer(config: &Config) -> CorsLayer {
    let allowed_origins: Vec<HeaderValue> = std::iter::once(config.frontend_url.as_str())
        .chain(config.cors_extra_origins.iter().map(String::as_str))
        .filter_map(|o| match o.trim().parse::<HeaderValue>() {
            Ok(hv) => Some(hv),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring unparsable CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
        ])
        .allow_credentials(true)
}

/// Full HTTP surface. Register and login are rate limited per client IP,
/// so the server must be run with `into_make_service_with_connect_info`.
pub fn build_router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/api/register", post(handlers::auth::register))
        .route("/api/login", post(handlers::auth::login))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::rate_limit::throttle_auth,
        ));

    let cron_routes = Router::new()
        .route(
            "/api/cron/generate-reflections",
            post(handlers::cron::generate_reflections),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::cron::require_cron_secret,
        ));

    let public_routes = Router::new()
        .route("/api/health", get(handlers::health::health_check))
        .route("/api/readyz", get(handlers::health::readyz))
        .merge(auth_routes)
        .merge(cron_routes);

    let upload_limit = state.config.max_audio_bytes + MULTIPART_OVERHEAD;

    let protected_routes = Router::new()
        // Profile & partner
        .route(
            "/api/profile",
            get(handlers::profile::get_profile).patch(handlers::profile::update_profile),
        )
        .route("/api/invite-partner", post(handlers::profile::invite_partner))
        // Journal
        .route(
            "/api/journal-entries",
            post(handlers::journal::create_entry).get(handlers::journal::list_entries),
        )
        .route(
            "/api/journal-entries/:id",
            put(handlers::journal::update_entry).delete(handlers::journal::delete_entry),
        )
        // Moods
        .route(
            "/api/mood-entries",
            post(handlers::moods::create_mood).get(handlers::moods::list_moods),
        )
        // Reflections
        .route(
            "/api/generate-reflection",
            post(handlers::reflections::generate_reflection),
        )
        .route(
            "/api/backfill-reflection",
            post(handlers::reflections::backfill_reflection),
        )
        // Views
        .route("/api/calendar/:year/:month", get(handlers::calendar::get_month))
        .route("/api/statistics", get(handlers::statistics::get_statistics))
        // Read receipts & notes
        .route(
            "/api/access-logs/:entry_id",
            get(handlers::access_logs::list_for_entry),
        )
        .route("/api/private-notes", post(handlers::private_notes::save_note))
        .route(
            "/api/private-notes/:entry_id",
            get(handlers::private_notes::get_note),
        )
        // Audio
        .route(
            "/api/upload-audio",
            post(handlers::audio::upload_audio).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::middleware::require_auth,
        ));

    let cors = cors_layer(&state.config);

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
