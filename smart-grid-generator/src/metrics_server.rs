use std::net::SocketAddr;

use axum::{routing::get, Router};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

static PROM_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

#[derive(thiserror::Error, Debug)]
pub enum MetricsError {
    #[error("invalid metrics bind address '{addr}': {source}")]
    BindAddr {
        addr: String,
        source: std::net::AddrParseError,
    },
    #[error("failed to install Prometheus metrics recorder: {0}")]
    Recorder(#[from] metrics_exporter_prometheus::BuildError),
}

/// Install the Prometheus recorder and serve `GET /metrics` on `bind_addr`.
///
/// Must be called from within a tokio runtime.
pub fn init(bind_addr: &str) -> Result<(), MetricsError> {
    let addr: SocketAddr = bind_addr.parse().map_err(|source| MetricsError::BindAddr {
        addr: bind_addr.to_string(),
        source,
    })?;

    let handle = PrometheusBuilder::new().install_recorder()?;
    // Only the first call installs a recorder; a second one fails above.
    let _ = PROM_HANDLE.set(handle);

    tokio::spawn(async move {
        let app = Router::new().route("/metrics", get(metrics_handler));

        match tokio::net::TcpListener::bind(addr).await {
            Ok(listener) => {
                tracing::info!(%addr, "serving metrics");
                if let Err(e) = axum::serve(listener, app.into_make_service()).await {
                    tracing::error!(error = %e, "metrics server error");
                }
            }
            Err(e) => {
                tracing::error!(error = %e, %addr, "failed to bind metrics listener");
            }
        }
    });

    Ok(())
}

async fn metrics_handler() -> String {
    PROM_HANDLE.get().map(PrometheusHandle::render).unwrap_or_default()
}
