use axum::{extract::State, Form, Json};
use lazy_static::lazy_static;
use regex::Regex;
use tower_sessions::Session;
use tracing::{debug, error, info, instrument, warn};

use crate::{
    auth::{
        dto::{ActionResponse, DeleteAccountForm, FormView, LoginForm, ProfileView, RegisterForm},
        session::{self, CurrentUser, SessionUser},
    },
    error::AppError,
    posts::dto::PostSummary,
    state::AppState,
};

/// Static bootstrap administrator account. It is the only way to obtain an
/// administrator session: every gateway-backed login is forced to
/// `is_admin = false`. Flagged in DESIGN.md.
const BACKDOOR_EMAIL: &str = "admin@gmail.com";
const BACKDOOR_PASSWORD: &str = "admin@1234";
const BACKDOOR_USER_ID: &str = "admin_user";

const LOGIN_FAILED: &str = "Login failed. Please check your credentials.";

fn is_backdoor(email: &str, password: &str) -> bool {
    email == BACKDOOR_EMAIL && password == BACKDOOR_PASSWORD
}

fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub async fn register_form() -> Json<FormView> {
    Json(FormView { view: "register" })
}

pub async fn login_form() -> Json<FormView> {
    Json(FormView { view: "login" })
}

pub async fn delete_account_form(CurrentUser(_user): CurrentUser) -> Json<FormView> {
    Json(FormView {
        view: "delete_account",
    })
}

#[instrument(skip(state, form))]
pub async fn register(
    State(state): State<AppState>,
    Form(mut form): Form<RegisterForm>,
) -> Result<Json<ActionResponse>, AppError> {
    form.email = form.email.trim().to_lowercase();

    if form.email.is_empty()
        || form.first_name.trim().is_empty()
        || form.last_name.trim().is_empty()
        || form.password.is_empty()
    {
        return Err(AppError::validation("All fields are required."));
    }
    if !is_valid_email(&form.email) {
        warn!(email = %form.email, "invalid email");
        return Err(AppError::validation("Invalid email address."));
    }

    let db = state.db()?;
    // The profile row itself is created by a trigger on the remote side.
    db.sign_up(&form.email, &form.password, form.first_name.trim(), form.last_name.trim())
        .await
        .map_err(|e| {
            if e.is_duplicate_email() {
                warn!(email = %form.email, "email already registered");
                AppError::DuplicateEmail
            } else {
                error!(error = %e, email = %form.email, "registration failed");
                AppError::from(e)
            }
        })?;

    info!(email = %form.email, "user registered");
    Ok(Json(ActionResponse::redirecting(
        "Registration successful! Please log in.",
        "/login",
    )))
}

#[instrument(skip(state, session, form))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Json<ActionResponse>, AppError> {
    if is_backdoor(&form.email, &form.password) {
        let user = SessionUser {
            id: BACKDOOR_USER_ID.into(),
            email: form.email.clone(),
            name: "Admin".into(),
            is_admin: true,
            access_token: None,
        };
        session::establish(&session, &user).await?;
        info!("admin login");
        return Ok(Json(ActionResponse::redirecting(
            "Admin login successful!",
            "/admin",
        )));
    }

    let db = state.db()?;
    let signed_in = db.sign_in(&form.email, &form.password).await.map_err(|e| {
        warn!(email = %form.email, error = %e, "login rejected");
        AppError::Authentication(LOGIN_FAILED.into())
    })?;

    // Display name comes from the profile; missing or unreadable profiles
    // fall back to a neutral name rather than failing the login.
    let name = match db.profile_by_id(&signed_in.user.id).await {
        Ok(Some(profile)) if !profile.first_name.trim().is_empty() => profile.first_name,
        _ => "User".to_string(),
    };

    let user = SessionUser {
        id: signed_in.user.id,
        email: signed_in.user.email.unwrap_or(form.email),
        name,
        // Stored admin flags are ignored on this path.
        is_admin: false,
        access_token: Some(signed_in.access_token),
    };
    session::establish(&session, &user).await?;

    info!(user_id = %user.id, "user logged in");
    Ok(Json(ActionResponse::redirecting(
        "Login successful!",
        "/dashboard",
    )))
}

/// Sign-out against the gateway is best effort; the session is cleared no
/// matter what.
#[instrument(skip(state, session))]
pub async fn logout(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<ActionResponse>, AppError> {
    if let Some(user) = session::current_user(&session).await {
        if let (Some(token), Ok(db)) = (user.access_token.as_deref(), state.db()) {
            if let Err(e) = db.sign_out(token).await {
                debug!(error = %e, "gateway sign-out failed; clearing session anyway");
            }
        }
    }
    session::destroy(&session).await?;
    Ok(Json(ActionResponse::redirecting(
        "You have been logged out successfully.",
        "/",
    )))
}

#[instrument(skip(state, session, form))]
pub async fn delete_account(
    State(state): State<AppState>,
    session: Session,
    CurrentUser(user): CurrentUser,
    Form(form): Form<DeleteAccountForm>,
) -> Result<Json<ActionResponse>, AppError> {
    if form.password.is_empty() {
        return Err(AppError::validation(
            "Password is required to delete your account.",
        ));
    }
    if form.confirm_delete != "DELETE" {
        return Err(AppError::validation(
            "Please type \"DELETE\" to confirm account deletion.",
        ));
    }

    let db = state.db()?;
    // Re-verify the password with a fresh sign-in before touching anything.
    db.sign_in(&user.email, &form.password).await.map_err(|e| {
        warn!(user_id = %user.id, error = %e, "account deletion password check failed");
        AppError::Authentication("Invalid password. Account deletion cancelled.".into())
    })?;

    // Three independent deletions; a failure partway leaves a partially
    // deleted account. The profile removal cascades to the auth identity.
    db.delete_posts_by_author(&user.id).await?;
    db.delete_otps_for_user(&user.id).await?;
    db.delete_profile(&user.id).await?;

    session::destroy(&session).await?;
    info!(user_id = %user.id, "account deleted");
    Ok(Json(ActionResponse::redirecting(
        "Your account has been permanently deleted. We're sorry to see you go!",
        "/",
    )))
}

#[instrument(skip(state))]
pub async fn profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<ProfileView>, AppError> {
    let db = state.db()?;
    let profile = db
        .profile_by_id(&user.id)
        .await?
        .ok_or_else(|| AppError::not_found("User profile not found."))?;
    let posts = db.list_posts_by_author(&user.id).await?;
    Ok(Json(ProfileView {
        user: profile,
        posts: posts.into_iter().map(PostSummary::from).collect(),
    }))
}

#[cfg(test)]
mod auth_tests {
    use super::*;

    #[test]
    fn backdoor_requires_the_exact_pair() {
        assert!(is_backdoor("admin@gmail.com", "admin@1234"));
        assert!(!is_backdoor("admin@gmail.com", "wrong"));
        assert!(!is_backdoor("user@gmail.com", "admin@1234"));
        assert!(!is_backdoor("", ""));
    }

    #[test]
    fn email_format_check() {
        assert!(is_valid_email("ada@example.com"));
        assert!(!is_valid_email("ada@example"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("a b@example.com"));
    }
}
