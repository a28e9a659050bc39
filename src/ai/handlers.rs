use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use crate::{
    ai::{
        fallback::fallback_response,
        gateway::{classify_failure, failure_message, parse_headlines, parse_keywords},
    },
    auth::session::CurrentUser,
    error::AppError,
    state::AppState,
};

const HEADLINE_PROMPT: &str = "Generate 5 engaging, concise, and SEO-friendly blog post \
    headlines for the following content. Return only the headlines, each on a new line.";
const SUMMARY_PROMPT: &str =
    "Summarize this blog post in 2-3 concise sentences, capturing the main points.";
const KEYWORDS_PROMPT: &str = "Suggest 5-7 relevant SEO keywords for this blog post. \
    Return them as a single, comma-separated list.";
const IMPROVE_PROMPT: &str = "Improve this blog content for better readability, engagement, \
    and clarity. Fix any grammatical errors and enhance the flow, but retain the original meaning.";

/// The combined suggestion call only sends the head of the content.
const BUNDLE_CONTENT_LIMIT: usize = 1000;

const CHATBOT_UNAVAILABLE: &str = "AI service is not available right now. Please try again later.";

#[derive(Debug, Deserialize)]
pub struct SuggestRequest {
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct HeadlinesResponse {
    pub headlines: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub summary: String,
}

#[derive(Debug, Serialize)]
pub struct KeywordsResponse {
    pub keywords: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ImprovedContentResponse {
    pub improved_content: String,
}

#[derive(Debug, Serialize)]
pub struct SuggestionsResponse {
    pub suggestions: String,
}

#[derive(Debug, Serialize)]
pub struct ChatbotResponse {
    pub response: String,
    pub status: &'static str,
}

/// Shared call pattern for the suggestion endpoints: configured client,
/// non-empty content, fixed instruction prompt, classified failure.
async fn run_generation(
    state: &AppState,
    instruction: &str,
    content: &str,
) -> Result<String, AppError> {
    let ai = state.ai()?;
    if content.trim().is_empty() {
        return Err(AppError::validation("Content is required."));
    }
    let prompt = format!("{}\n\n---\n\n{}", instruction, content);
    ai.generate(&prompt).await.map_err(|e| {
        error!(error = %e, "generation call failed");
        AppError::Upstream(failure_message(classify_failure(&e)).to_string())
    })
}

#[instrument(skip(state, req))]
pub async fn suggest_headline(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Json(req): Json<SuggestRequest>,
) -> Result<Json<HeadlinesResponse>, AppError> {
    let raw = run_generation(&state, HEADLINE_PROMPT, &req.content).await?;
    Ok(Json(HeadlinesResponse {
        headlines: parse_headlines(&raw),
    }))
}

#[instrument(skip(state, req))]
pub async fn generate_summary(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Json(req): Json<SuggestRequest>,
) -> Result<Json<SummaryResponse>, AppError> {
    let raw = run_generation(&state, SUMMARY_PROMPT, &req.content).await?;
    Ok(Json(SummaryResponse {
        summary: raw.trim().to_string(),
    }))
}

#[instrument(skip(state, req))]
pub async fn suggest_keywords(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Json(req): Json<SuggestRequest>,
) -> Result<Json<KeywordsResponse>, AppError> {
    let raw = run_generation(&state, KEYWORDS_PROMPT, &req.content).await?;
    Ok(Json(KeywordsResponse {
        keywords: parse_keywords(&raw),
    }))
}

#[instrument(skip(state, req))]
pub async fn improve_content(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Json(req): Json<SuggestRequest>,
) -> Result<Json<ImprovedContentResponse>, AppError> {
    let raw = run_generation(&state, IMPROVE_PROMPT, &req.content).await?;
    Ok(Json(ImprovedContentResponse {
        improved_content: raw.trim().to_string(),
    }))
}

/// One-shot bundle: headline + short summary + keywords in a single prompt,
/// returned verbatim for the editor sidebar.
#[instrument(skip(state, req))]
pub async fn suggest_bundle(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Json(req): Json<SuggestRequest>,
) -> Result<Json<SuggestionsResponse>, AppError> {
    let ai = state.ai()?;
    if req.content.trim().is_empty() {
        return Err(AppError::validation("Please write some blog content first."));
    }

    let head: String = req.content.chars().take(BUNDLE_CONTENT_LIMIT).collect();
    let prompt = format!(
        "Analyze this blog content and suggest:\n\
         1. A catchy headline\n\
         2. A short summary (max 30 words)\n\
         3. 5 SEO keywords\n\n\
         Content:\n{}...",
        head
    );
    let raw = ai.generate(&prompt).await.map_err(|e| {
        error!(error = %e, "generation call failed");
        AppError::Upstream(failure_message(classify_failure(&e)).to_string())
    })?;
    Ok(Json(SuggestionsResponse { suggestions: raw }))
}

fn chat_prompt(name: &str, email: &str, is_admin: bool, message: &str) -> String {
    let role = if is_admin { "Admin" } else { "Regular User" };
    format!(
        "You are an AI assistant for a blog platform called \"AI BlogPlatform\". \
         You are helping {name}.\n\n\
         User Context:\n\
         - Name: {name}\n\
         - Email: {email}\n\
         - Role: {role}\n\n\
         Platform Features Available:\n\
         - Create and edit blog posts with AI assistance\n\
         - AI-powered content suggestions (headlines, summaries, SEO keywords)\n\
         - Dashboard to manage posts and profile\n\
         - Admin features (if admin): user management, post moderation\n\n\
         Your Role:\n\
         - Be helpful, friendly, and concise\n\
         - Provide specific guidance about using the platform\n\
         - Offer writing tips and content creation advice\n\
         - Help with navigation and feature discovery\n\
         - Keep responses under 150 words unless detailed explanation is needed\n\n\
         User's message: {message}\n\n\
         Provide a helpful, personalized response:"
    )
}

/// Single-turn assistant. Upstream failures are never surfaced as errors:
/// the reply degrades to a keyword-matched canned response with
/// `status: "fallback"`.
#[instrument(skip(state, req))]
pub async fn chatbot(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatbotResponse>, AppError> {
    let message = req.message.trim().to_string();
    if message.is_empty() {
        return Err(AppError::validation("Message is required."));
    }
    let Some(ai) = state.ai.as_deref() else {
        return Err(AppError::ServiceUnavailable(CHATBOT_UNAVAILABLE));
    };

    let prompt = chat_prompt(&user.name, &user.email, user.is_admin, &message);
    match ai.generate(&prompt).await {
        Ok(text) => {
            info!(email = %user.email, "chatbot reply generated");
            Ok(Json(ChatbotResponse {
                response: text,
                status: "success",
            }))
        }
        Err(e) => {
            error!(error = %e, "chatbot generation failed; serving fallback");
            Ok(Json(ChatbotResponse {
                response: fallback_response(&user.name, &message),
                status: "fallback",
            }))
        }
    }
}

#[cfg(test)]
mod handler_tests {
    use super::*;
    use crate::ai::gateway::{AiError, GenerativeClient};
    use crate::auth::session::SessionUser;
    use async_trait::async_trait;
    use std::sync::Arc;

    struct CannedAi(&'static str);

    #[async_trait]
    impl GenerativeClient for CannedAi {
        async fn generate(&self, _prompt: &str) -> Result<String, AiError> {
            Ok(self.0.to_string())
        }
    }

    struct FailingAi;

    #[async_trait]
    impl GenerativeClient for FailingAi {
        async fn generate(&self, _prompt: &str) -> Result<String, AiError> {
            Err(AiError::Api {
                status: 429,
                body: "quota exceeded".into(),
            })
        }
    }

    fn user() -> SessionUser {
        SessionUser {
            id: "u-1".into(),
            email: "ada@example.com".into(),
            name: "Ada".into(),
            is_admin: false,
            access_token: None,
        }
    }

    fn state_with(ai: Arc<dyn GenerativeClient>) -> AppState {
        let mut state = AppState::fake();
        state.ai = Some(ai);
        state
    }

    #[tokio::test]
    async fn keywords_endpoint_splits_the_upstream_text() {
        let state = state_with(Arc::new(CannedAi("seo, blog, ai,  writing")));
        let Json(resp) = suggest_keywords(
            State(state),
            CurrentUser(user()),
            Json(SuggestRequest {
                content: "Some post content".into(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(resp.keywords, vec!["seo", "blog", "ai", "writing"]);
    }

    #[tokio::test]
    async fn headline_endpoint_keeps_line_order() {
        let state = state_with(Arc::new(CannedAi("One\n\n  Two  \nThree\n")));
        let Json(resp) = suggest_headline(
            State(state),
            CurrentUser(user()),
            Json(SuggestRequest {
                content: "Some post content".into(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(resp.headlines, vec!["One", "Two", "Three"]);
    }

    #[tokio::test]
    async fn empty_content_is_rejected_before_any_call() {
        let state = state_with(Arc::new(FailingAi));
        let err = generate_summary(
            State(state),
            CurrentUser(user()),
            Json(SuggestRequest {
                content: "   ".into(),
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn unconfigured_client_yields_service_unavailable() {
        let state = AppState::fake();
        let err = suggest_headline(
            State(state),
            CurrentUser(user()),
            Json(SuggestRequest {
                content: "content".into(),
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::ServiceUnavailable(_)));
    }

    #[tokio::test]
    async fn upstream_failure_maps_to_a_classified_message() {
        let state = state_with(Arc::new(FailingAi));
        let err = improve_content(
            State(state),
            CurrentUser(user()),
            Json(SuggestRequest {
                content: "content".into(),
            }),
        )
        .await
        .unwrap_err();
        match err {
            AppError::Upstream(msg) => assert!(msg.contains("quota")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn chatbot_succeeds_only_with_nonempty_upstream_text() {
        let state = state_with(Arc::new(CannedAi("Happy to help!")));
        let Json(resp) = chatbot(
            State(state),
            CurrentUser(user()),
            Json(ChatRequest {
                message: "hello there".into(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(resp.status, "success");
        assert_eq!(resp.response, "Happy to help!");
    }

    #[tokio::test]
    async fn chatbot_masks_upstream_failure_with_keyword_fallback() {
        let state = state_with(Arc::new(FailingAi));
        let Json(resp) = chatbot(
            State(state),
            CurrentUser(user()),
            Json(ChatRequest {
                message: "how do I use the dashboard?".into(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(resp.status, "fallback");
        assert!(resp.response.contains("dashboard shows"));
    }

    #[tokio::test]
    async fn chatbot_rejects_empty_messages() {
        let state = state_with(Arc::new(CannedAi("x")));
        let err = chatbot(
            State(state),
            CurrentUser(user()),
            Json(ChatRequest {
                message: "  ".into(),
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
