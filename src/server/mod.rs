//! HTTP front end.
//!
//! Routes:
//! - `GET /health`
//! - `GET /categories`
//! - `POST /detect` (multipart `file`, query `num_versions`, `seed`)
//! - `POST /detect-objects` (multipart `file`)
//! - `GET /output/...` serves rendered images

mod handlers;
mod types;

use std::sync::{Arc, Mutex};

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub use handlers::ApiError;
pub use types::*;

use crate::config::Config;
use crate::detect::Detector;
use crate::error::RedecorError;

/// State shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Inference needs `&mut`, so requests take turns on the detector.
    pub detector: Arc<Mutex<Box<dyn Detector>>>,
    pub detector_name: Arc<str>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(detector: Box<dyn Detector>, config: Config) -> Self {
        let detector_name = Arc::from(detector.name());
        Self {
            detector: Arc::new(Mutex::new(detector)),
            detector_name,
            config: Arc::new(config),
        }
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Build the router with all endpoints.
pub fn build_router(state: AppState) -> Router {
    let config = Arc::clone(&state.config);
    let server = &config.server;
    let output_dir = config.paths.output_dir.clone();

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/categories", get(handlers::list_categories))
        .route("/detect", post(handlers::detect_and_rearrange))
        .route("/detect-objects", post(handlers::detect_objects))
        .nest_service("/output", ServeDir::new(output_dir))
        .layer(DefaultBodyLimit::max(server.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&server.cors_origins))
        .with_state(state)
}

/// Serve on an already bound listener until the task is dropped.
pub async fn serve(listener: TcpListener, state: AppState) -> Result<(), RedecorError> {
    for dir in [
        &state.config.paths.output_dir,
        &state.config.paths.temp_dir,
        &state.config.paths.intermediate_dir,
    ] {
        tokio::fs::create_dir_all(dir).await?;
    }

    let app = build_router(state);
    axum::serve(listener, app).await?;
    Ok(())
}

/// Bind `config.server.addr` and serve.
pub async fn start_server(state: AppState) -> Result<(), RedecorError> {
    let addr = state.config.server.addr.clone();
    let listener = TcpListener::bind(&addr).await?;
    info!(
        addr = %listener.local_addr()?,
        detector = %state.detector_name,
        "redecor server listening"
    );
    serve(listener, state).await
}
