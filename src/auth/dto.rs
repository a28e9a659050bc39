use serde::{Deserialize, Serialize};

use crate::posts::dto::PostSummary;
use crate::supabase::Profile;

/// Registration form body.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub password: String,
}

/// Login form body.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Account-deletion confirmation body.
#[derive(Debug, Deserialize)]
pub struct DeleteAccountForm {
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_delete: String,
}

/// View-model for the GET side of a form route; the renderer picks the
/// template by name.
#[derive(Debug, Serialize)]
pub struct FormView {
    pub view: &'static str,
}

/// Outcome of a state-changing operation: a notice for the user plus where
/// the renderer should navigate next.
#[derive(Debug, Serialize)]
pub struct ActionResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
}

impl ActionResponse {
    pub fn redirecting(message: impl Into<String>, redirect: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            redirect: Some(redirect.into()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProfileView {
    pub user: Profile,
    pub posts: Vec<PostSummary>,
}

#[cfg(test)]
mod dto_tests {
    use super::*;

    #[test]
    fn action_response_omits_missing_redirect() {
        let json = serde_json::to_string(&ActionResponse {
            message: "ok".into(),
            redirect: None,
        })
        .unwrap();
        assert!(!json.contains("redirect"));

        let json = serde_json::to_string(&ActionResponse::redirecting("ok", "/login")).unwrap();
        assert!(json.contains("\"/login\""));
    }
}
