use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::server::handlers::{auth, chat, config, conversations, health, pdfs, prediction, stats};
use crate::state::AppState;

/// Creates the application router with all routes and middleware.
pub fn router(state: Arc<AppState>) -> Router {
    let cors_layer = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/api/auth/signup", post(auth::signup))
        .route("/api/auth/login", post(auth::login))
        .route("/api/pdfs/upload", post(pdfs::upload_pdf))
        .route("/api/pdfs/upload-batch", post(pdfs::upload_pdfs_batch))
        .route("/api/pdfs/global", get(pdfs::get_global_pdfs))
        .route(
            "/api/pdfs/conversation/:conversation_id",
            get(pdfs::get_conversation_pdfs),
        )
        .route(
            "/api/pdfs/:pdf_id",
            get(pdfs::get_pdf_info).delete(pdfs::delete_pdf),
        )
        .route("/api/pdfs/:pdf_id/download", get(pdfs::download_pdf))
        .route("/api/chat/query", post(chat::query_rag))
        .route("/api/chat/chat", post(chat::chat))
        .route(
            "/api/conversations",
            get(conversations::list_conversations).post(conversations::create_conversation),
        )
        .route(
            "/api/conversations/:conversation_id",
            get(conversations::get_conversation).delete(conversations::delete_conversation),
        )
        .route(
            "/api/conversations/:conversation_id/messages",
            get(conversations::list_messages).post(conversations::add_message),
        )
        .route(
            "/api/config/providers",
            get(config::get_providers).post(config::configure_providers),
        )
        .route("/api/config/providers/reset", post(config::reset_providers))
        .route("/api/stats", get(stats::get_statistics))
        .route("/api/predict", post(prediction::predict))
        .route("/api/predict/predictions", get(prediction::list_predictions))
        .with_state(state)
        .layer(cors_layer)
        .layer(TraceLayer::new_for_http())
}
