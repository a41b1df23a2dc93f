//! Scriptorium API Gateway
//!
//! HTTP surface over the store and the derived-data pipelines:
//! - Article, comment and citation management
//! - Dialogs and multimodal messages
//! - File uploads and download links
//! - PDF, audio and export pipelines
//! - Keyword and semantic search

pub mod handlers;
pub mod middleware;

use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use scriptorium_common::{config::AppConfig, embeddings::Embedder, BlobStore, Store};
use scriptorium_export::ExportProcessor;
use scriptorium_ingestion::{ChunkingConfig, PdfProcessor};
use scriptorium_search::RagService;
use scriptorium_transcription::{AudioProcessor, TranscriptionEngine};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Store,
    pub blobs: Arc<dyn BlobStore>,
    pub pdf: Arc<PdfProcessor>,
    pub audio: Arc<AudioProcessor>,
    pub export: Arc<ExportProcessor>,
    pub rag: Arc<RagService>,
    pub prometheus: Option<PrometheusHandle>,
}

impl AppState {
    /// Wire the pipelines around a fresh store
    pub fn new(
        config: AppConfig,
        blobs: Arc<dyn BlobStore>,
        embedder: Arc<dyn Embedder>,
        engine: Arc<dyn TranscriptionEngine>,
    ) -> Self {
        let store = Store::new();

        let pdf = PdfProcessor::new(
            store.clone(),
            blobs.clone(),
            embedder.clone(),
            ChunkingConfig::from(&config.chunking),
        )
        .with_concurrency(config.embedding.concurrency);
        let audio = AudioProcessor::new(store.clone(), blobs.clone(), engine);
        let export = ExportProcessor::new(store.clone(), blobs.clone(), config.export_url_ttl());
        let rag = RagService::new(store.clone(), embedder);

        Self {
            config: Arc::new(config),
            store,
            blobs,
            pdf: Arc::new(pdf),
            audio: Arc::new(audio),
            export: Arc::new(export),
            rag: Arc::new(rag),
            prometheus: None,
        }
    }

    /// Expose a Prometheus recorder on `/metrics`
    pub fn with_prometheus(mut self, handle: PrometheusHandle) -> Self {
        self.prometheus = Some(handle);
        self
    }
}

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();
    let body_limit = DefaultBodyLimit::max(state.config.server.max_upload_bytes);
    let timeout =
        TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, state.config.request_timeout());

    let api_routes = Router::new()
        // Articles
        .route(
            "/articles",
            post(handlers::articles::create_article).get(handlers::articles::list_articles),
        )
        .route("/articles/upload-pdf", post(handlers::articles::upload_pdf))
        .route("/articles/search", get(handlers::articles::search_articles))
        .route(
            "/articles/{id}",
            get(handlers::articles::get_article)
                .put(handlers::articles::update_article)
                .delete(handlers::articles::delete_article),
        )
        .route("/articles/{id}/comments", post(handlers::articles::add_comment))
        .route(
            "/articles/{id}/comments/audio",
            post(handlers::articles::add_audio_comment),
        )
        .route(
            "/articles/{id}/citations",
            post(handlers::articles::add_citation).get(handlers::articles::get_citations),
        )

        // Dialogs and messages
        .route(
            "/dialogs",
            post(handlers::dialogs::create_dialog).get(handlers::dialogs::list_dialogs),
        )
        .route(
            "/dialogs/{id}",
            get(handlers::dialogs::get_dialog).delete(handlers::dialogs::delete_dialog),
        )
        .route("/dialogs/{id}/messages", post(handlers::messages::create_message))
        .route(
            "/dialogs/{id}/messages/multimodal",
            post(handlers::messages::create_multimodal_message),
        )
        .route(
            "/messages/{id}",
            get(handlers::messages::get_message).delete(handlers::messages::delete_message),
        )

        // Files
        .route("/upload/audio", post(handlers::uploads::upload_audio))
        .route("/upload/image", post(handlers::uploads::upload_image))
        .route("/files/{*key}", get(handlers::uploads::file_url))

        // Pipelines
        .route("/process/pdf/{article_id}", post(handlers::processing::process_pdf))
        .route("/process/audio/{message_id}", post(handlers::processing::process_audio))
        .route("/process/status/{job_id}", get(handlers::processing::job_status))
        .route("/export/word", post(handlers::export::export_word))
        .route("/export/{job_id}", get(handlers::export::export_status))

        // Search
        .route("/search", get(handlers::search::keyword))
        .route("/rag/query", post(handlers::search::rag_query));

    Router::new()
        .route("/healthz", get(handlers::health::health))
        .route("/metrics", get(handlers::health::metrics))
        .nest("/api", api_routes)
        .route_layer(axum::middleware::from_fn(middleware::track_metrics))
        .layer(body_limit)
        .layer(timeout)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(propagate_id)
        .layer(request_id)
        .with_state(state)
}
