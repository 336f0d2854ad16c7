//! API server entry point.

use std::time::Duration;

use checkout::InMemoryProductCatalog;
use common::Money;
use domain::ProductSnapshot;
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const OUTBOX_DISPATCH_INTERVAL: Duration = Duration::from_millis(500);

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

/// Seeds the in-memory catalog so the server is usable out of the box.
fn demo_catalog() -> InMemoryProductCatalog {
    let catalog = InMemoryProductCatalog::new();
    catalog.insert(ProductSnapshot::new(1, "Mechanical Keyboard", Money::from_cents(12_900)));
    catalog.insert(ProductSnapshot::new(2, "Trackball Mouse", Money::from_cents(5_450)));
    catalog.insert(ProductSnapshot::new(3, "USB-C Dock", Money::from_cents(18_999)));
    catalog.insert(ProductSnapshot::new(4, "27in Monitor", Money::from_cents(32_900)));
    catalog
}

#[tokio::main]
async fn main() {
    // 1. Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Install Prometheus metrics recorder
    let prometheus_builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    let metrics_handle = prometheus_builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Create application state over in-memory stores
    let (state, dispatcher, _publisher) = api::create_default_state(demo_catalog());

    // 4. Run the outbox dispatch loop in the background
    tokio::spawn(async move {
        dispatcher.run(OUTBOX_DISPATCH_INTERVAL).await;
    });

    // 5. Build the application
    let app = api::create_app(state, metrics_handle);

    // 6. Start server
    let config = api::config::Config::from_env();
    let addr = config.addr();
    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("server shut down gracefully");
}
