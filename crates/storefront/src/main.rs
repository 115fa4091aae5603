//! Prickly Pear Storefront - public e-commerce site.
//!
//! This binary serves the public-facing shop on port 3000.
//!
//! # Architecture
//!
//! - Axum with JSON endpoints; rendering is a client concern
//! - `PostgreSQL` for all persistent state (catalog, orders, sessions)
//! - Session-scoped cart, explicit save on every mutation
//! - Stripe-shaped payment processor, settlement over signed webhooks
//! - In-process job queue for fire-and-forget mail

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::net::SocketAddr;

use secrecy::ExposeSecret;
use sentry::integrations::tracing as sentry_tracing;
use tower_http::trace::TraceLayer;
use tower_sessions::cookie::{Key, time};
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use prickly_pear_storefront::config::StorefrontConfig;
use prickly_pear_storefront::state::AppState;
use prickly_pear_storefront::tasks::{JobQueue, Worker};
use prickly_pear_storefront::{db, routes};

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    // Load configuration from environment (needed for Sentry init)
    let config = StorefrontConfig::from_env().expect("Failed to load configuration");

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    // Initialize tracing with EnvFilter and Sentry integration
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "prickly_pear_storefront=info,tower_http=debug".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    // Initialize database connection pool
    let pool = db::create_pool(&config.database_url)
        .await
        .expect("Failed to create database pool");
    tracing::info!("Database pool created");

    // NOTE: Schema migrations are NOT run automatically on startup.
    // Run them explicitly via: cargo run -p prickly-pear-cli -- migrate

    // Session store (tower-sessions manages its own table)
    let session_store = PostgresStore::new(pool.clone());
    session_store
        .migrate()
        .await
        .expect("Failed to migrate session store");
    // Key::derive_from wants at least 32 bytes; config validation enforces it.
    let signing_key = Key::derive_from(config.session_secret.expose_secret().as_bytes());
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(config.base_url.starts_with("https://"))
        .with_expiry(Expiry::OnInactivity(time::Duration::days(14)))
        .with_signed(signing_key);

    // Background job worker
    let (jobs, rx) = JobQueue::new();
    let worker = Worker::new(pool.clone(), &config.mail).expect("Failed to build mail worker");
    tokio::spawn(worker.run(rx));

    let addr = SocketAddr::from((config.host, config.port));
    let state = AppState::new(config, pool, jobs);

    let app = routes::router()
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    tracing::info!("Storefront listening on {addr}");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listener");
    axum::serve(listener, app)
        .await
        .expect("Server exited with error");
}
