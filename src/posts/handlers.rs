use axum::{
    extract::{Multipart, Path, State},
    Form, Json,
};
use bytes::Bytes;
use time::OffsetDateTime;
use tower_sessions::Session;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        dto::{ActionResponse, FormView},
        session::{self, CurrentUser},
    },
    error::AppError,
    posts::{
        dto::{
            CreatedPostResponse, DashboardView, EditPostForm, EditPostView, HomeView, PostCard,
            PostSummary, PostView,
        },
        uploads::{allowed_file, upload_cover_image},
    },
    state::AppState,
    supabase::{NewPost, PostChanges},
};

const POST_NOT_EDITABLE: &str = "Post not found or you do not have permission to edit it.";
const POST_NOT_VIEWABLE: &str = "Post not found or you do not have permission to view it.";
const COVER_UPLOAD_WARNING: &str =
    "Cover image failed to upload, but you can add it later by editing the post.";

#[instrument(skip(state))]
pub async fn home(State(state): State<AppState>) -> Result<Json<HomeView>, AppError> {
    let db = state.db()?;
    let posts = db.list_published_posts().await?;
    Ok(Json(HomeView {
        posts: posts.into_iter().map(PostCard::from).collect(),
    }))
}

#[instrument(skip(state))]
pub async fn dashboard(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<DashboardView>, AppError> {
    let db = state.db()?;
    let posts = db.list_posts_by_author(&user.id).await?;
    Ok(Json(DashboardView {
        posts: posts.into_iter().map(PostSummary::from).collect(),
    }))
}

pub async fn create_post_form(CurrentUser(_user): CurrentUser) -> Json<FormView> {
    Json(FormView {
        view: "create_post",
    })
}

/// Fields of the multipart create-post submission.
#[derive(Default)]
struct CreatePostFields {
    title: String,
    content: String,
    video_url: String,
    action: String,
    cover: Option<(String, Bytes)>,
}

async fn read_create_fields(mut multipart: Multipart) -> CreatePostFields {
    let mut fields = CreatePostFields::default();
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("title") => fields.title = field.text().await.unwrap_or_default(),
            Some("content") => fields.content = field.text().await.unwrap_or_default(),
            Some("video_url") => fields.video_url = field.text().await.unwrap_or_default(),
            Some("action") => fields.action = field.text().await.unwrap_or_default(),
            Some("cover_image") => {
                let filename = field.file_name().map(str::to_string).unwrap_or_default();
                let data = field.bytes().await.unwrap_or_default();
                if !filename.is_empty() && !data.is_empty() {
                    fields.cover = Some((filename, data));
                }
            }
            _ => {}
        }
    }
    fields
}

#[instrument(skip(state, multipart))]
pub async fn create_post(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    multipart: Multipart,
) -> Result<Json<CreatedPostResponse>, AppError> {
    let fields = read_create_fields(multipart).await;

    if fields.title.trim().is_empty() || fields.content.trim().is_empty() {
        return Err(AppError::validation("Title and content are required."));
    }
    let published = fields.action == "publish";

    // The cover image is optional and its upload must never sink the post:
    // a failure downgrades to a warning on the response.
    let mut warning = None;
    let mut cover_image_url = None;
    if let Some((filename, data)) = fields.cover {
        if allowed_file(&filename) {
            match &state.storage {
                Some(storage) => {
                    match upload_cover_image(storage.as_ref(), &user.id, &filename, data).await {
                        Ok(url) => cover_image_url = Some(url),
                        Err(e) => {
                            error!(error = %e, user_id = %user.id, "cover image upload failed");
                            warning = Some(COVER_UPLOAD_WARNING.to_string());
                        }
                    }
                }
                None => {
                    warn!("object storage unconfigured; skipping cover image");
                    warning = Some(COVER_UPLOAD_WARNING.to_string());
                }
            }
        }
    }

    let video_url = fields.video_url.trim();
    let new_post = NewPost {
        author_id: user.id.clone(),
        title: fields.title,
        content: fields.content,
        video_links: if video_url.is_empty() {
            Vec::new()
        } else {
            vec![video_url.to_string()]
        },
        cover_image_url,
        published,
    };

    let db = state.db()?;
    let post = db.insert_post(&new_post).await.map_err(|e| {
        error!(error = %e, user_id = %user.id, "post creation failed");
        AppError::from(e)
    })?;

    let status = if published {
        "published"
    } else {
        "saved as a draft"
    };
    info!(post_id = %post.id, user_id = %user.id, "post created");
    Ok(Json(CreatedPostResponse {
        id: post.id,
        message: format!("Blog post successfully {}!", status),
        redirect: "/dashboard".into(),
        warning,
    }))
}

#[instrument(skip(state))]
pub async fn edit_post_form(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(post_id): Path<Uuid>,
) -> Result<Json<EditPostView>, AppError> {
    let db = state.db()?;
    let post = db
        .post_for_author(post_id, &user.id)
        .await?
        .ok_or_else(|| AppError::not_found(POST_NOT_EDITABLE))?;
    Ok(Json(EditPostView::from(post)))
}

#[instrument(skip(state, form))]
pub async fn edit_post(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(post_id): Path<Uuid>,
    Form(form): Form<EditPostForm>,
) -> Result<Json<ActionResponse>, AppError> {
    if form.title.trim().is_empty() || form.content.trim().is_empty() {
        return Err(AppError::validation("Title and content are required."));
    }

    let db = state.db()?;
    // Scoped load: someone else's post is indistinguishable from a missing
    // one.
    db.post_for_author(post_id, &user.id)
        .await?
        .ok_or_else(|| AppError::not_found(POST_NOT_EDITABLE))?;

    let changes = PostChanges {
        title: form.title,
        content: form.content,
        published: form.action == "publish",
        updated_at: OffsetDateTime::now_utc(),
    };
    db.update_post(post_id, &user.id, &changes).await?;

    info!(post_id = %post_id, user_id = %user.id, "post updated");
    Ok(Json(ActionResponse::redirecting(
        "Blog post updated successfully!",
        "/dashboard",
    )))
}

/// Removal is immediate and irreversible; allowed for the author or an
/// administrator, via the elevated client.
#[instrument(skip(state))]
pub async fn delete_post(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(post_id): Path<Uuid>,
) -> Result<Json<ActionResponse>, AppError> {
    let admin = state.admin_db()?;
    let author_id = admin.post_author_id(post_id).await?;
    let is_author = author_id.as_deref() == Some(user.id.as_str());

    if !is_author && !user.is_admin {
        return Err(AppError::Authorization);
    }

    admin.delete_post(post_id).await?;
    info!(post_id = %post_id, user_id = %user.id, "post deleted");
    Ok(Json(ActionResponse::redirecting(
        "Post deleted successfully.",
        "/dashboard",
    )))
}

/// Published posts are public; drafts are visible to their author only and
/// otherwise behave exactly like missing posts.
#[instrument(skip(state, session))]
pub async fn view_post(
    State(state): State<AppState>,
    session: Session,
    Path(post_id): Path<Uuid>,
) -> Result<Json<PostView>, AppError> {
    let db = state.db()?;
    let row = db
        .post_with_author(post_id)
        .await?
        .ok_or_else(|| AppError::not_found(POST_NOT_VIEWABLE))?;

    if !row.post.published {
        let viewer = session::current_user(&session).await;
        let is_author = viewer.map_or(false, |v| v.id == row.post.author_id);
        if !is_author {
            return Err(AppError::not_found(POST_NOT_VIEWABLE));
        }
    }

    Ok(Json(PostView::from(row)))
}
