use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::error::AppError;

/// Key for the authenticated user record in the session.
pub const SESSION_USER_KEY: &str = "user";

const LOGIN_REQUIRED: &str = "You must be logged in to view this page.";
const SESSION_STORE_FAILED: &str = "Session store is unavailable.";

/// Everything the app remembers about a signed-in user for the lifetime of
/// one browser session.
#[derive(Clone, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    pub email: String,
    pub name: String,
    pub is_admin: bool,
    /// Upstream access token, kept for the best-effort sign-out.
    #[serde(default)]
    pub access_token: Option<String>,
}

// The access token must not end up in tracing spans.
impl std::fmt::Debug for SessionUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionUser")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("name", &self.name)
            .field("is_admin", &self.is_admin)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

pub async fn establish(session: &Session, user: &SessionUser) -> Result<(), AppError> {
    session
        .insert(SESSION_USER_KEY, user)
        .await
        .map_err(|_| AppError::ServiceUnavailable(SESSION_STORE_FAILED))
}

pub async fn current_user(session: &Session) -> Option<SessionUser> {
    session
        .get::<SessionUser>(SESSION_USER_KEY)
        .await
        .ok()
        .flatten()
}

/// Removes the session from the store and expires the cookie.
pub async fn destroy(session: &Session) -> Result<(), AppError> {
    session
        .flush()
        .await
        .map_err(|_| AppError::ServiceUnavailable(SESSION_STORE_FAILED))
}

/// Guard: the route needs an authenticated user. Typed replacement for a
/// login-required decorator; the rejection happens before the handler body.
pub struct CurrentUser(pub SessionUser);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::Authentication(LOGIN_REQUIRED.into()))?;
        let user = current_user(&session)
            .await
            .ok_or_else(|| AppError::Authentication(LOGIN_REQUIRED.into()))?;
        Ok(CurrentUser(user))
    }
}

/// Guard: the route needs an administrator session.
pub struct AdminUser(pub SessionUser);

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        if !user.is_admin {
            return Err(AppError::Authorization);
        }
        Ok(AdminUser(user))
    }
}
