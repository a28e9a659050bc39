use tracing::{error, warn};

#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    pub url: String,
    pub anon_key: String,
    pub service_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub username: String,
    pub password: String,
    pub server: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase: Option<SupabaseConfig>,
    pub gemini_api_key: Option<String>,
    pub smtp: Option<SmtpConfig>,
    pub session_secret: String,
}

impl AppConfig {
    /// Reads every setting from the environment. Nothing is required: a
    /// missing credential disables the matching feature and logs instead of
    /// failing startup.
    pub fn from_env() -> Self {
        let supabase = match (env_opt("SUPABASE_URL"), env_opt("SUPABASE_KEY")) {
            (Some(url), Some(anon_key)) => {
                let service_key = env_opt("SUPABASE_SERVICE_KEY");
                if service_key.is_none() {
                    warn!("SUPABASE_SERVICE_KEY not set; admin operations may be restricted by RLS");
                }
                Some(SupabaseConfig {
                    url: url.trim_end_matches('/').to_string(),
                    anon_key,
                    service_key,
                })
            }
            _ => {
                error!("Supabase credentials not found; set SUPABASE_URL and SUPABASE_KEY");
                None
            }
        };

        let gemini_api_key = env_opt("GEMINI_API_KEY");
        if gemini_api_key.is_none() {
            warn!("GEMINI_API_KEY not set; AI features will be disabled");
        }

        let smtp = match (env_opt("SMTP_USERNAME"), env_opt("SMTP_PASSWORD")) {
            (Some(username), Some(password)) => Some(SmtpConfig {
                username,
                password,
                server: env_opt("SMTP_SERVER").unwrap_or_else(|| "smtp.gmail.com".into()),
                port: env_opt("SMTP_PORT")
                    .and_then(|v| v.parse::<u16>().ok())
                    .unwrap_or(587),
            }),
            _ => {
                warn!("SMTP_USERNAME or SMTP_PASSWORD not set; outbound email is disabled");
                None
            }
        };

        let session_secret = env_opt("SECRET_KEY").unwrap_or_else(|| {
            warn!("SECRET_KEY not set; using the default session secret");
            "a-secret-key".into()
        });

        Self {
            supabase,
            gemini_api_key,
            smtp,
            session_secret,
        }
    }
}

fn env_opt(key: &str) -> Option<String> {
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => Some(v),
        _ => None,
    }
}
