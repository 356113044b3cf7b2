pub mod paths;

use std::env;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub use paths::AppPaths;

use crate::core::errors::ApiError;

/// The active provider triple. Each name is resolved by the capability
/// factories; unknown names are rejected there, not here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSelection {
    pub llm_provider: String,
    pub embedding_provider: String,
    pub vectordb_provider: String,
}

/// Runtime settings, loaded from `config.yml` and overridable per-field via
/// environment variables (the env var wins).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub llm_provider: String,
    pub embedding_provider: String,
    pub vectordb_provider: String,

    pub gemini_api_key: Option<String>,
    pub llm_model: String,
    pub embedding_model: String,
    pub llamacpp_base_url: String,
    pub ngrok_url: Option<String>,
    pub qdrant_url: String,
    pub qdrant_collection: String,

    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub request_timeout_secs: u64,

    /// Whether `chat` retrieval also sees global (conversation-less)
    /// documents. `query` always does.
    pub chat_includes_global: bool,

    pub token_ttl_minutes: i64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            llm_provider: "gemini".to_string(),
            embedding_provider: "llamacpp".to_string(),
            vectordb_provider: "sqlite".to_string(),
            gemini_api_key: None,
            llm_model: "gemini-2.5-pro".to_string(),
            embedding_model: "embedding-001".to_string(),
            llamacpp_base_url: "http://127.0.0.1:8088".to_string(),
            ngrok_url: None,
            qdrant_url: "http://127.0.0.1:6334".to_string(),
            qdrant_collection: "roadmate_chunks".to_string(),
            chunk_size: 1000,
            chunk_overlap: 200,
            request_timeout_secs: 60,
            chat_includes_global: false,
            token_ttl_minutes: 30,
        }
    }
}

impl Settings {
    pub fn load(paths: &AppPaths) -> Result<Self, ApiError> {
        let mut settings = match config_path(paths) {
            Some(path) => {
                let contents = fs::read_to_string(&path).map_err(|e| {
                    ApiError::Configuration(format!("failed to read {}: {}", path.display(), e))
                })?;
                serde_yaml::from_str(&contents).map_err(|e| {
                    ApiError::Configuration(format!("invalid config {}: {}", path.display(), e))
                })?
            }
            None => Settings::default(),
        };
        settings.apply_env_overrides();
        Ok(settings)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = env::var("LLM_PROVIDER") {
            self.llm_provider = v;
        }
        if let Ok(v) = env::var("EMBEDDING_PROVIDER") {
            self.embedding_provider = v;
        }
        if let Ok(v) = env::var("VECTORDB_PROVIDER") {
            self.vectordb_provider = v;
        }
        if let Ok(v) = env::var("GEMINI_API_KEY") {
            if !v.trim().is_empty() {
                self.gemini_api_key = Some(v);
            }
        }
        if let Ok(v) = env::var("LLM_MODEL") {
            self.llm_model = v;
        }
        if let Ok(v) = env::var("EMBEDDING_MODEL") {
            self.embedding_model = v;
        }
        if let Ok(v) = env::var("LLAMACPP_BASE_URL") {
            self.llamacpp_base_url = v;
        }
        if let Ok(v) = env::var("NGROK_URL") {
            if !v.trim().is_empty() {
                self.ngrok_url = Some(v);
            }
        }
        if let Ok(v) = env::var("QDRANT_URL") {
            self.qdrant_url = v;
        }
    }

    /// The provider triple configured as the default for this process.
    pub fn default_selection(&self) -> ProviderSelection {
        ProviderSelection {
            llm_provider: self.llm_provider.clone(),
            embedding_provider: self.embedding_provider.clone(),
            vectordb_provider: self.vectordb_provider.clone(),
        }
    }
}

fn config_path(paths: &AppPaths) -> Option<PathBuf> {
    if let Ok(path) = env::var("ROADMATE_CONFIG_PATH") {
        return Some(PathBuf::from(path));
    }

    let user_config = paths.user_data_dir.join("config.yml");
    if user_config.exists() {
        return Some(user_config);
    }

    let project_config = paths.project_root.join("config.yml");
    if project_config.exists() {
        return Some(project_config);
    }

    None
}
