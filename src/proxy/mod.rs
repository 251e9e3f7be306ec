//! # Products proxy
//!
//! Single read-only route that keeps the record store credential on the
//! server. The browser talks to `/api/products`; the proxy forwards one fixed
//! query upstream and reshapes the records into [`Product`]s.
//!
//! ## Wire contract
//! - `GET` → 200 `{ success: true, products, timestamp }` or 500
//!   `{ success: false, error, timestamp }`
//! - `OPTIONS` → 200, empty body
//! - anything else → 405 `{ error: "Method not allowed" }`
//!
//! Every response carries the same permissive CORS headers.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_ALLOW_ORIGIN,
        },
        HeaderValue, Method, StatusCode,
    },
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tokio::{net::TcpListener, signal};
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::{debug, info, warn};

pub mod error;

pub use error::ProxyError;

use crate::catalog::{Product, ProductsEnvelope};
use crate::source::{CredentialSource, RecordSource};

pub const PRODUCTS_ROUTE: &str = "/api/products";
pub const METHOD_NOT_ALLOWED_MESSAGE: &str = "Method not allowed";

#[derive(Clone, Debug)]
pub struct ProxyState {
    pub source: RecordSource,
    pub credentials: CredentialSource,
}

#[derive(Serialize)]
struct MethodNotAllowed {
    error: &'static str,
}

pub fn router(state: ProxyState) -> Router {
    Router::new()
        .route(
            PRODUCTS_ROUTE,
            get(products_handler)
                .options(preflight_handler)
                .head(method_not_allowed_handler)
                .fallback(method_not_allowed_handler),
        )
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("GET"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Content-Type"),
        ))
        .with_state(Arc::new(state))
}

async fn products_handler(
    State(state): State<Arc<ProxyState>>,
) -> Result<Json<ProductsEnvelope>, ProxyError> {
    let credentials = state.credentials.resolve()?;
    let page = state.source.fetch_active(&credentials).await?;

    let products: Vec<Product> = page.records.into_iter().map(Product::from_record).collect();
    info!(count = products.len(), "serving products");

    Ok(Json(ProductsEnvelope::success(products)))
}

async fn preflight_handler() -> StatusCode {
    StatusCode::OK
}

async fn method_not_allowed_handler(method: Method) -> impl IntoResponse {
    debug!(%method, "rejecting method");
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(MethodNotAllowed {
            error: METHOD_NOT_ALLOWED_MESSAGE,
        }),
    )
}

pub async fn serve(listener: TcpListener, state: ProxyState) -> std::io::Result<()> {
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                warn!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
