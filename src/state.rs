use std::sync::Arc;

use tracing::{debug, warn};

use crate::ai::gateway::{GeminiClient, GenerativeClient};
use crate::config::AppConfig;
use crate::error::AppError;
use crate::storage::{ObjectStorage, SupabaseStorage};
use crate::supabase::Supabase;

const DB_UNAVAILABLE: &str = "Database connection not available. Please check configuration.";
const AI_UNCONFIGURED: &str = "AI service is not configured. Please check your GEMINI_API_KEY.";

/// Shared handles for every gateway the handlers talk to. Each handle is
/// `None` when its credentials were missing at startup; handlers check at
/// call time and degrade the matching feature.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    /// Restricted client, subject to row-level policies.
    pub supabase: Option<Arc<Supabase>>,
    /// Elevated client; falls back to the restricted one without a
    /// service-role key.
    pub supabase_admin: Option<Arc<Supabase>>,
    pub storage: Option<Arc<dyn ObjectStorage>>,
    pub ai: Option<Arc<dyn GenerativeClient>>,
}

impl AppState {
    pub fn from_env() -> Self {
        Self::from_config(Arc::new(AppConfig::from_env()))
    }

    pub fn from_config(config: Arc<AppConfig>) -> Self {
        if let Some(smtp) = &config.smtp {
            debug!(
                server = %smtp.server,
                port = smtp.port,
                username = %smtp.username,
                "outbound email transport configured"
            );
        }

        let (supabase, supabase_admin, storage) = match &config.supabase {
            Some(sb) => {
                let restricted = Arc::new(Supabase::new(&sb.url, &sb.anon_key));
                let admin = match &sb.service_key {
                    Some(key) => Arc::new(Supabase::new(&sb.url, key)),
                    None => {
                        warn!("admin operations will use the restricted client");
                        restricted.clone()
                    }
                };
                let storage: Arc<dyn ObjectStorage> =
                    Arc::new(SupabaseStorage::new(&sb.url, &sb.anon_key));
                (Some(restricted), Some(admin), Some(storage))
            }
            None => (None, None, None),
        };

        let ai = config
            .gemini_api_key
            .as_deref()
            .map(|key| Arc::new(GeminiClient::new(key)) as Arc<dyn GenerativeClient>);

        Self {
            config,
            supabase,
            supabase_admin,
            storage,
            ai,
        }
    }

    pub fn db(&self) -> Result<&Supabase, AppError> {
        self.supabase
            .as_deref()
            .ok_or(AppError::ServiceUnavailable(DB_UNAVAILABLE))
    }

    pub fn admin_db(&self) -> Result<&Supabase, AppError> {
        self.supabase_admin
            .as_deref()
            .ok_or(AppError::ServiceUnavailable(DB_UNAVAILABLE))
    }

    pub fn ai(&self) -> Result<&dyn GenerativeClient, AppError> {
        self.ai
            .as_deref()
            .ok_or(AppError::ServiceUnavailable(AI_UNCONFIGURED))
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        let config = Arc::new(AppConfig {
            supabase: None,
            gemini_api_key: None,
            smtp: None,
            session_secret: "test-secret".into(),
        });
        Self {
            config,
            supabase: None,
            supabase_admin: None,
            storage: None,
            ai: None,
        }
    }
}
