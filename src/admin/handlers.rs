use axum::{
    extract::{Path, State},
    Form, Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use crate::{
    auth::{dto::ActionResponse, session::AdminUser},
    error::AppError,
    posts::dto::PostCard,
    state::AppState,
    supabase::{NewProfile, Profile},
};

#[derive(Debug, Serialize)]
pub struct AdminDashboardView {
    pub users: Vec<Profile>,
    pub posts: Vec<PostCard>,
    pub total_users: usize,
    pub admin_count: usize,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    /// Checkbox field: present when checked.
    #[serde(default)]
    pub is_admin: Option<String>,
}

/// Moderation overview, read through the elevated client so row-level
/// policies do not hide other users' rows.
#[instrument(skip(state))]
pub async fn dashboard(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> Result<Json<AdminDashboardView>, AppError> {
    let db = state.admin_db()?;
    let users = db.list_profiles().await?;
    let posts = db.list_all_posts().await?;

    let total_users = users.len();
    let admin_count = users.iter().filter(|u| u.is_admin).count();

    Ok(Json(AdminDashboardView {
        users,
        posts: posts.into_iter().map(PostCard::from).collect(),
        total_users,
        admin_count,
    }))
}

/// The one path that can set the administrator flag: an explicit profile
/// insert after the elevated auth create.
#[instrument(skip(state, form))]
pub async fn create_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Form(form): Form<CreateUserForm>,
) -> Result<Json<ActionResponse>, AppError> {
    if form.email.trim().is_empty() || form.password.is_empty() {
        return Err(AppError::validation("Email and password are required."));
    }

    let db = state.admin_db()?;
    let created = db
        .admin_create_user(form.email.trim(), &form.password)
        .await
        .map_err(|e| {
            error!(error = %e, "admin user creation failed");
            AppError::from(e)
        })?;

    db.insert_profile(&NewProfile {
        id: created.id.clone(),
        email: form.email.trim().to_string(),
        first_name: form.first_name,
        last_name: form.last_name,
        is_admin: form.is_admin.is_some(),
    })
    .await?;

    info!(user_id = %created.id, by = %admin.id, "user created by admin");
    Ok(Json(ActionResponse::redirecting(
        "User created successfully!",
        "/admin",
    )))
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(user_id): Path<String>,
) -> Result<Json<ActionResponse>, AppError> {
    let db = state.admin_db()?;
    db.admin_delete_user(&user_id).await.map_err(|e| {
        error!(error = %e, %user_id, "admin user deletion failed");
        AppError::from(e)
    })?;

    info!(%user_id, by = %admin.id, "user deleted by admin");
    Ok(Json(ActionResponse::redirecting(
        "User deleted successfully.",
        "/admin",
    )))
}
