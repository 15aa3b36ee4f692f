mod handlers;


use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{DefaultBodyLimit, Request},
    http::{header::CONTENT_TYPE, HeaderValue, Method},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::bootstrap::{BootstrapOutcome, Bootstrapper};
use crate::config::Config;
use crate::error::{GeoError, GeoResult};
use crate::store::GeoStore;

pub use handlers::ErrorResponse;

/// HTTP facade over one S2GEO index
pub struct PolygonServer {
    config: Config,
    store: Arc<dyn GeoStore>,
}

/// Shared application state
pub struct AppState {
    /// Store handle shared by every request
    pub store: Arc<dyn GeoStore>,
    /// Index the routes operate on
    pub index_name: String,
}

impl PolygonServer {
    pub fn new(config: Config, store: Arc<dyn GeoStore>) -> Self {
        Self { config, store }
    }

    /// Make sure the index exists, populating it when it was just created
    pub async fn bootstrap(&self) -> GeoResult<BootstrapOutcome> {
        let outcome = Bootstrapper::new(self.store.clone())
            .bootstrap(&self.config.index.name, &self.config.index.geojson_path)
            .await?;

        if let BootstrapOutcome::Populated(report) = &outcome {
            if !report.failures.is_empty() {
                warn!(
                    "{} of {} polygons could not be stored",
                    report.failures.len(),
                    report.attempted()
                );
            }
        }

        Ok(outcome)
    }

    /// Build the router with every route and middleware layer
    pub fn router(&self) -> Router {
        let state = Arc::new(AppState {
            store: self.store.clone(),
            index_name: self.config.index.name.clone(),
        });

        let cors = CorsLayer::new()
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([CONTENT_TYPE])
            .allow_origin(Any)
            .max_age(Duration::from_secs(3600));

        let api = Router::new()
            .route("/polygons", get(handlers::list_polygons).post(handlers::fetch_polygons))
            .route("/polygons/:id", get(handlers::fetch_polygon))
            .route("/search/polygons/by_polygon", post(handlers::search_by_polygon))
            .route("/search/polygons/by_point", post(handlers::search_by_point));

        let mut app = Router::new()
            .route("/ping", get(handlers::ping))
            .route("/health", get(handlers::health))
            .nest(&self.config.server.api_prefix, api);

        let static_dir = &self.config.server.static_dir;
        if static_dir.is_dir() {
            info!("Serving front-end bundle from {} at /app", static_dir.display());
            app = app.nest_service("/app", ServeDir::new(static_dir));
        }

        app.layer(DefaultBodyLimit::disable())
            .layer(RequestBodyLimitLayer::new(self.config.server.max_request_size))
            .layer(middleware::from_fn(security_middleware))
            .layer(middleware::from_fn(request_id_middleware))
            .layer(cors)
            .with_state(state)
    }

    /// Serve until Ctrl+C or SIGTERM
    pub async fn run(self) -> GeoResult<()> {
        let app = self.router();

        let bind_addr = format!("{}:{}", self.config.server.host, self.config.server.port);
        let listener = TcpListener::bind(&bind_addr)
            .await
            .map_err(|e| GeoError::Config(format!("Failed to bind to {}: {}", bind_addr, e)))?;

        info!("HTTP server listening on {}", bind_addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| GeoError::Internal(format!("Server error: {}", e)))?;

        info!("HTTP server stopped");
        Ok(())
    }
}

/// Tag every request with an id, both in its log span and in the response headers
async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4();
    let span = info_span!(
        "request",
        %request_id,
        method = %request.method(),
        path = %request.uri().path(),
    );

    let mut response = next.run(request).instrument(span).await;

    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        response.headers_mut().insert("x-request-id", value);
    }
    response
}

/// Middleware for security headers
async fn security_middleware(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;

    let headers = response.headers_mut();
    headers.insert("X-Content-Type-Options", HeaderValue::from_static("nosniff"));
    headers.insert("X-Frame-Options", HeaderValue::from_static("DENY"));
    headers.insert(
        "Referrer-Policy",
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );

    response
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {}", e);
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
                error!("Failed to install SIGTERM handler: {}", e);
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
