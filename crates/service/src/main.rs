//! Order Hub - order ingestion and lookup service.
//!
//! This binary consumes orders from NATS `JetStream`, stores them in
//! `PostgreSQL`, and serves cached lookups over HTTP on port 8080.
//!
//! # Startup
//!
//! Strictly sequential: database pool → cache → cache restoration →
//! bus subscription → HTTP listener. A database or bus connection failure
//! at this stage aborts the process.
//!
//! # Shutdown
//!
//! On Ctrl+C or SIGTERM the HTTP server drains in-flight requests (bounded
//! by `SHUTDOWN_GRACE_SECS`) and the consumer finishes its current message.
//! Only then are the bus connection and the database pool closed.

#![cfg_attr(not(test), forbid(unsafe_code))]

use sentry::integrations::tracing as sentry_tracing;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use order_hub_service::cache::OrderCache;
use order_hub_service::config::ServiceConfig;
use order_hub_service::db::{self, OrderRepository};
use order_hub_service::ingest::{OrderBus, Pipeline, run_consumer};
use order_hub_service::restore::restore_cache;
use order_hub_service::routes;
use order_hub_service::state::AppState;

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ServiceConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

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

/// Initialize tracing with `EnvFilter`, text or JSON output, and Sentry.
fn init_tracing(config: &ServiceConfig) {
    // Defaults to info level for our crate if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "order_hub_service=info,order_hub=info,tower_http=debug".into());

    let json = config
        .json_logs
        .then(|| tracing_subscriber::fmt::layer().json());
    let text = (!config.json_logs).then(tracing_subscriber::fmt::layer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json)
        .with(text)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() {
    // Load configuration from environment (needed for Sentry init)
    let config = ServiceConfig::from_env().expect("Failed to load configuration");

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);
    init_tracing(&config);

    // NOTE: Migrations are NOT run automatically on startup.
    // Run them explicitly via: cargo run -p order-hub-cli -- migrate
    let pool = db::create_pool(&config.database)
        .await
        .expect("Failed to connect to database");
    info!("Database pool created");

    let cache = OrderCache::new(config.cache_capacity);
    let store = OrderRepository::new(pool.clone());
    restore_cache(&store, &cache).await;

    let bus = OrderBus::connect(&config.nats)
        .await
        .expect("Failed to connect to NATS");
    let messages = bus
        .subscribe()
        .await
        .expect("Failed to subscribe to order messages");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let pipeline = Pipeline::new(store, cache.clone());
    let consumer_shutdown = shutdown_rx.clone();
    let consumer =
        tokio::spawn(async move { run_consumer(messages, &pipeline, consumer_shutdown).await });

    let state = AppState::new(pool.clone(), cache);
    let app = routes::app(state, &config.static_dir, config.request_timeout)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction());

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");
    info!("order service listening on {}", addr);

    let mut server_shutdown = shutdown_rx;
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = server_shutdown.wait_for(|stop| *stop).await;
            })
            .await
    });

    let mut server_finished = false;
    tokio::select! {
        () = shutdown_signal() => {}
        result = &mut server => {
            server_finished = true;
            error!(?result, "HTTP server exited unexpectedly");
        }
    }

    let _ = shutdown_tx.send(true);

    if !server_finished {
        match tokio::time::timeout(config.shutdown_grace, &mut server).await {
            Ok(Ok(Ok(()))) => info!("HTTP server stopped"),
            Ok(Ok(Err(e))) => error!(error = %e, "HTTP server error"),
            Ok(Err(e)) => error!(error = %e, "HTTP server task failed"),
            Err(_) => {
                warn!("Shutdown grace period elapsed with requests in flight");
                server.abort();
            }
        }
    }

    if let Err(e) = consumer.await {
        error!(error = %e, "Order consumer task failed");
    }

    bus.close().await;
    pool.close().await;
    info!("Service stopped");
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown");
}
