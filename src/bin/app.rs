use adapter::database::connect_database_with;
use anyhow::{Context, Result};
use api::route::{health::build_health_check_routers, v1};
use axum::Router;
use kernel::notification::deliver_next;
use registry::AppRegistry;
use shared::config::{AppConfig, QueueConfig};
use shared::env::{which, Environment};
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::time::sleep;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tower_http::LatencyUnit;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    init_logger()?;
    bootstrap().await
}

fn init_logger() -> Result<()> {
    let log_level = match which() {
        Environment::Development => "debug",
        Environment::Production => "info",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| log_level.into());

    let subscriber = tracing_subscriber::fmt::layer()
        .with_file(true)
        .with_line_number(true)
        .with_target(false);

    tracing_subscriber::registry()
        .with(subscriber)
        .with(env_filter)
        .try_init()?;

    Ok(())
}

async fn bootstrap() -> Result<()> {
    let app_config = AppConfig::new()?;
    let queue_config = app_config.queue.clone();
    let pool = connect_database_with(&app_config.database);

    let registry = AppRegistry::new(pool, app_config);

    {
        let registry = registry.clone();
        tokio::spawn(async move {
            notification_worker(registry, queue_config).await;
        });
    }

    let app = Router::new()
        .merge(build_health_check_routers())
        .merge(v1::routes())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .latency_unit(LatencyUnit::Millis),
                ),
        )
        .with_state(registry);

    let addr = SocketAddr::new(Ipv4Addr::LOCALHOST.into(), 8080);
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", addr);
    axum::serve(listener, app)
        .await
        .context("Unexpected error happened in server")
        .inspect_err(|e| {
            tracing::error!(
                error.cause_chain = ?e, error.message = %e, "Unexpected error"
            )
        })
}

/// Drains the notification queue on its own schedule. Nothing in the
/// request path ever waits on this loop.
async fn notification_worker(registry: AppRegistry, config: QueueConfig) {
    let idle = Duration::from_secs(config.poll_interval_secs);
    loop {
        let now = registry.clock().now();
        match deliver_next(
            registry.notification_queue().as_ref(),
            registry.mail_sender().as_ref(),
            now,
        )
        .await
        {
            // a job was handled; check for the next one right away
            Ok(true) => {}
            Ok(false) => sleep(idle).await,
            Err(e) => {
                tracing::error!(
                    error.cause_chain = ?e,
                    error.message = %e,
                    "notification worker step failed"
                );
                sleep(idle).await;
            }
        }
    }
}
