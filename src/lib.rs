pub mod api;
pub mod config;
pub mod infrastructure;
pub mod models;
pub mod services;
pub mod utils;

use crate::api::middleware::request_id::{REQUEST_ID_HEADER, request_id_middleware};
use crate::config::AppConfig;
use crate::services::document_service::DocumentService;
use crate::services::storage::BlobStore;
use crate::services::summarizer::Summarizer;
use axum::{
    Router,
    http::HeaderValue,
    middleware::from_fn,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::documents::upload_document,
        api::handlers::documents::summarize_document,
        api::handlers::health::health_check,
    ),
    components(
        schemas(
            api::handlers::documents::UploadDocumentForm,
            api::handlers::documents::SummarizeRequest,
            api::handlers::health::HealthResponse,
            models::UploadResult,
            models::SummarizationResult,
        )
    ),
    tags(
        (name = "documents", description = "PDF upload and summarization"),
        (name = "system", description = "Service status")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub documents: Arc<DocumentService>,
    pub summarizer: Arc<dyn Summarizer>,
    pub storage: Arc<dyn BlobStore>,
    pub config: AppConfig,
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

pub fn create_app(state: AppState) -> Router {
    // Multipart framing adds a little on top of the document itself
    let body_limit = state.config.max_file_size + 1024 * 1024;

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(api::handlers::health::health_check))
        .route(
            "/documents",
            post(api::handlers::documents::upload_document),
        )
        .route(
            "/documents/summary",
            post(api::handlers::documents::summarize_document),
        )
        // Inside the request-id layer so every span sees the final id
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    let request_id = request
                        .headers()
                        .get(&REQUEST_ID_HEADER)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("unknown");
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = %request_id,
                    )
                })
                .on_request(|request: &axum::http::Request<_>, _span: &tracing::Span| {
                    tracing::info!("📥 {} {}", request.method(), request.uri());
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     _span: &tracing::Span| {
                        tracing::info!(
                            "📤 Finished in {:?} with status {}",
                            latency,
                            response.status()
                        );
                    },
                ),
        )
        .layer(from_fn(request_id_middleware))
        .layer(cors_layer(&state.config))
        .layer(axum::extract::DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
