use std::sync::Arc;

use tokio::sync::RwLock;

use crate::core::config::{AppPaths, ProviderSelection, Settings};
use crate::core::errors::ApiError;
use crate::rag::{self, RagService};
use crate::repositories::Database;
use crate::services::{AuthService, ConversationService, PdfService, PredictionService};

struct ActiveRag {
    selection: ProviderSelection,
    service: Arc<RagService>,
}

/// Global application state shared across all routes.
///
/// The orchestrator lives behind a `RwLock<Arc<_>>`: reconfiguring providers
/// builds a complete new `RagService` and swaps the pointer, so requests that
/// already cloned the `Arc` keep the triple they started with.
pub struct AppState {
    pub paths: Arc<AppPaths>,
    pub settings: Settings,
    pub db: Database,
    pub auth: AuthService,
    pub pdf_service: PdfService,
    pub conversation_service: ConversationService,
    pub prediction: Option<PredictionService>,
    active: RwLock<ActiveRag>,
}

impl AppState {
    pub async fn initialize() -> Result<Arc<Self>, ApiError> {
        let paths = Arc::new(AppPaths::new());
        let settings = Settings::load(&paths)?;

        let db = Database::connect(&paths.db_path).await?;
        let auth = AuthService::new(&db, settings.token_ttl_minutes);
        let pdf_service = PdfService::new(&db);
        let conversation_service = ConversationService::new(&db);

        let prediction = match PredictionService::load(&paths.model_artifact_path, &db) {
            Ok(service) => Some(service),
            Err(err) => {
                tracing::warn!("prediction model unavailable: {}", err);
                None
            }
        };

        let selection = settings.default_selection();
        let service = rag::build(&selection, &settings, &paths, &db).await?;

        Ok(Arc::new(AppState {
            paths,
            settings,
            db,
            auth,
            pdf_service,
            conversation_service,
            prediction,
            active: RwLock::new(ActiveRag { selection, service }),
        }))
    }

    /// The current orchestrator. Handlers clone this at request start.
    pub async fn rag(&self) -> Arc<RagService> {
        self.active.read().await.service.clone()
    }

    pub async fn selection(&self) -> ProviderSelection {
        self.active.read().await.selection.clone()
    }

    /// Builds a new orchestrator for `selection` and swaps it in. In-flight
    /// requests are unaffected; the change applies to subsequent requests.
    pub async fn reconfigure(
        &self,
        selection: ProviderSelection,
    ) -> Result<ProviderSelection, ApiError> {
        let service = rag::build(&selection, &self.settings, &self.paths, &self.db).await?;

        let mut active = self.active.write().await;
        active.selection = selection.clone();
        active.service = service;

        Ok(selection)
    }
}
