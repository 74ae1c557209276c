//! HTTP layer: binds a listen address, optionally over TLS, and serves the
//! merged `/metrics` exposition for every configured region plus a `/health`
//! endpoint. Routing/TLS wiring follows the teacher's `exporter::new`
//! (tower-http request-id propagation + tracing span, `axum-server` for the
//! rustls acceptor) with the Postgres connection pool replaced by a list of
//! per-region `Collector`s.

use crate::collector::Collector;
use crate::config::ExporterConfig;
use anyhow::{Context, Result};
use axum::{
    Extension, Router,
    body::Body,
    http::{HeaderName, HeaderValue, Request},
    routing::get,
};
use axum_server::tls_rustls::RustlsConfig;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, set_header::SetRequestHeaderLayer, trace::TraceLayer,
};
use tracing::{Span, debug_span, info};
use ulid::Ulid;

mod handlers;
pub mod shutdown;

pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = if let Some(hash) = built_info::GIT_COMMIT_HASH {
    hash
} else {
    ":-("
};

/// Shared application state handed to every handler via `Extension`.
#[derive(Clone)]
pub struct AppState {
    pub collectors: Arc<Vec<Arc<Collector>>>,
}

fn router(state: AppState, metrics_path: &str) -> Router {
    Router::new()
        .route(metrics_path, get(handlers::metrics))
        .route("/health", get(handlers::health).options(handlers::health))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(Extension(state)),
        )
}

/// Build the router and serve it on `config.listen_address`, over TLS when
/// both `tls_cert_path`/`tls_key_path` are set, otherwise plain HTTP.
///
/// # Errors
/// Returns an error if the listen address can't be bound, if the TLS
/// certificate/key can't be loaded, or if the server exits with an I/O error.
pub async fn serve(config: &ExporterConfig, collectors: Vec<Arc<Collector>>) -> Result<()> {
    let state = AppState {
        collectors: Arc::new(collectors),
    };
    let app = router(state, &config.metrics_path);

    let addr: std::net::SocketAddr = config
        .listen_address
        .parse()
        .with_context(|| format!("invalid listen address {}", config.listen_address))?;

    match (&config.tls_cert_path, &config.tls_key_path) {
        (Some(cert), Some(key)) => {
            info!(%addr, "listening with TLS enabled");
            let tls_config = RustlsConfig::from_pem_file(cert, key)
                .await
                .context("loading TLS certificate/key")?;
            axum_server::bind_rustls(addr, tls_config)
                .serve(app.into_make_service())
                .await
                .context("HTTP server error")?;
        }
        _ => {
            info!(%addr, "listening");
            let listener = tokio::net::TcpListener::bind(addr)
                .await
                .with_context(|| format!("binding {addr}"))?;
            axum::serve(listener, app.into_make_service())
                .with_graceful_shutdown(shutdown::shutdown_signal_handler())
                .await
                .context("HTTP server error")?;
        }
    }

    Ok(())
}

fn make_span(request: &Request<Body>) -> Span {
    let headers = request.headers();
    let path = request.uri().path();
    let request_id = headers
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");

    debug_span!("http-request", path, ?headers, request_id)
}
