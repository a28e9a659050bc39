use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use thiserror::Error;

/// Upper bound on a single generation call; nothing else in the app has a
/// client-side timeout.
pub const GENERATION_TIMEOUT: Duration = Duration::from_secs(30);

const DEFAULT_MODEL: &str = "gemini-1.5-flash";

#[derive(Debug, Error)]
pub enum AiError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("generation service returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("generation service returned an empty response")]
    Empty,
}

/// Seam over the text-generation provider.
#[async_trait]
pub trait GenerativeClient: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, AiError>;
}

pub struct GeminiClient {
    http: Client,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: &str) -> Self {
        let http = Client::builder()
            .user_agent("blogforge")
            .timeout(GENERATION_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            http,
            api_key: api_key.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

#[async_trait]
impl GenerativeClient for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, AiError> {
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
            self.model
        );
        let resp = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&json!({ "contents": [{ "parts": [{ "text": prompt }] }] }))
            .send()
            .await
            .map_err(|e| AiError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AiError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = resp
            .json()
            .await
            .map_err(|e| AiError::Transport(e.to_string()))?;
        extract_text(&body).ok_or(AiError::Empty)
    }
}

/// Pulls the generated text out of a `generateContent` response body.
pub fn extract_text(body: &Value) -> Option<String> {
    let text = body
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .get(0)?
        .get("text")?
        .as_str()?
        .trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// User-facing categories for generation failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Auth,
    Quota,
    ModelUnavailable,
    Other,
}

/// Best-effort classification over the lower-cased error text. The matched
/// substrings are the contract; anything unmatched is `Other`.
pub fn classify_failure(err: &AiError) -> FailureKind {
    let text = err.to_string().to_lowercase();
    if text.contains("api_key") || text.contains("api key") || text.contains("unauthenticated") {
        FailureKind::Auth
    } else if text.contains("permission_denied")
        || text.contains("permission denied")
        || text.contains("quota")
        || text.contains("resource_exhausted")
    {
        FailureKind::Quota
    } else if text.contains("model") && text.contains("not found") {
        FailureKind::ModelUnavailable
    } else {
        FailureKind::Other
    }
}

pub fn failure_message(kind: FailureKind) -> &'static str {
    match kind {
        FailureKind::Auth => "AI service authentication failed. Please check your API key.",
        FailureKind::Quota => "You have exceeded your API quota or lack permissions.",
        FailureKind::ModelUnavailable => {
            "The configured AI model is not available. Please contact support."
        }
        FailureKind::Other => "An unexpected error occurred with the AI service.",
    }
}

/// Headlines come back one per line.
pub fn parse_headlines(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

/// Keywords come back as a single comma-separated list.
pub fn parse_keywords(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|kw| !kw.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod gateway_tests {
    use super::*;

    #[test]
    fn headlines_are_trimmed_nonempty_lines_in_order() {
        let raw = "  First headline \n\nSecond headline\n   \nThird";
        assert_eq!(
            parse_headlines(raw),
            vec!["First headline", "Second headline", "Third"]
        );
    }

    #[test]
    fn keywords_are_trimmed_nonempty_tokens_in_order() {
        assert_eq!(
            parse_keywords("seo, blog, ai,  writing"),
            vec!["seo", "blog", "ai", "writing"]
        );
        assert_eq!(parse_keywords("solo"), vec!["solo"]);
        assert_eq!(parse_keywords(" , ,"), Vec::<String>::new());
    }

    #[test]
    fn extract_text_reads_the_first_candidate() {
        let body = serde_json::json!({
            "candidates": [{
                "content": { "parts": [{ "text": "  generated  " }] }
            }]
        });
        assert_eq!(extract_text(&body).as_deref(), Some("generated"));
    }

    #[test]
    fn extract_text_rejects_empty_and_malformed_bodies() {
        let empty = serde_json::json!({
            "candidates": [{ "content": { "parts": [{ "text": "   " }] } }]
        });
        assert!(extract_text(&empty).is_none());
        assert!(extract_text(&serde_json::json!({})).is_none());
        assert!(extract_text(&serde_json::json!({ "candidates": [] })).is_none());
    }

    #[test]
    fn failures_classify_by_documented_substrings() {
        let auth = AiError::Api {
            status: 400,
            body: "API_KEY_INVALID: check your api_key".into(),
        };
        assert_eq!(classify_failure(&auth), FailureKind::Auth);

        let quota = AiError::Api {
            status: 429,
            body: "RESOURCE_EXHAUSTED: quota exceeded".into(),
        };
        assert_eq!(classify_failure(&quota), FailureKind::Quota);

        let missing = AiError::Api {
            status: 404,
            body: "requested model was not found".into(),
        };
        assert_eq!(classify_failure(&missing), FailureKind::ModelUnavailable);

        let other = AiError::Transport("connection reset".into());
        assert_eq!(classify_failure(&other), FailureKind::Other);
    }
}
