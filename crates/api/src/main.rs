//! API server entry point.

use std::sync::Arc;

use api::auth::{AuthState, StaticTokenVerifier};
use api::config::{Config, LogFormat};
use event_bus::{EventPublisher, PublisherConfig, RedisStreamSink, TracingEventSink};
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let registry = tracing_subscriber::registry().with(filter);

    match config.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

#[tokio::main]
async fn main() {
    // 1. Load configuration and initialize tracing
    let config = Config::from_env();
    init_tracing(&config);

    // 2. Install Prometheus metrics recorder
    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Start the event publisher on the configured bus
    let publisher_config = PublisherConfig {
        workers: config.publish_workers,
        queue_depth: config.publish_queue_depth,
    };
    let publisher = Arc::new(match &config.redis_url {
        Some(url) => {
            let sink = RedisStreamSink::connect(url)
                .await
                .expect("failed to connect to Redis");
            tracing::info!("publishing events to Redis streams");
            EventPublisher::start(sink, publisher_config)
        }
        None => {
            tracing::warn!("REDIS_URL not set, events are only logged");
            EventPublisher::start(TracingEventSink, publisher_config)
        }
    });

    // 4. Create downstream clients and application state
    let http = reqwest::Client::builder()
        .timeout(config.downstream_timeout)
        .build()
        .expect("failed to build HTTP client");
    let state = api::create_http_state(&config, http, Arc::clone(&publisher));

    // 5. Build the application
    let auth = match &config.auth_tokens {
        Some(tokens) => {
            let verifier = StaticTokenVerifier::parse(tokens);
            tracing::info!(tokens = verifier.len(), "authorization enabled");
            Some(AuthState::new(verifier))
        }
        None => {
            tracing::warn!("AUTH_TOKENS not set, product orchestration routes are unprotected");
            None
        }
    };
    let app = api::create_app(state, Arc::clone(&publisher), metrics_handle, auth);

    // 6. Start server
    let addr = config.addr();
    tracing::info!(
        %addr,
        service_address = %config.service_address,
        write_mode = ?config.write_mode,
        "starting API server"
    );

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    // 7. Deliver every accepted event before exiting
    publisher.drain().await;
    tracing::info!("server shut down gracefully");
}
