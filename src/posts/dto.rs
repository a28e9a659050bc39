use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::supabase::{AuthorName, Post, PostWithAuthor};

/// Display name of a post's author; posts whose profile embed is missing
/// render as "Unknown User".
#[derive(Debug, Serialize)]
pub struct AuthorView {
    pub first_name: String,
    pub last_name: String,
}

impl From<Option<AuthorName>> for AuthorView {
    fn from(author: Option<AuthorName>) -> Self {
        match author {
            Some(a) => Self {
                first_name: a.first_name.unwrap_or_else(|| "Unknown".into()),
                last_name: a.last_name.unwrap_or_else(|| "User".into()),
            },
            None => Self {
                first_name: "Unknown".into(),
                last_name: "User".into(),
            },
        }
    }
}

/// Listing row for the owner's own posts (dashboard, profile).
#[derive(Debug, Serialize)]
pub struct PostSummary {
    pub id: Uuid,
    pub title: String,
    pub published: bool,
    pub cover_image_url: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<Post> for PostSummary {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            title: post.title,
            published: post.published,
            cover_image_url: post.cover_image_url,
            created_at: post.created_at,
        }
    }
}

/// Public listing card with the author attached.
#[derive(Debug, Serialize)]
pub struct PostCard {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub cover_image_url: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub author: AuthorView,
}

impl From<PostWithAuthor> for PostCard {
    fn from(row: PostWithAuthor) -> Self {
        Self {
            id: row.post.id,
            title: row.post.title,
            content: row.post.content,
            cover_image_url: row.post.cover_image_url,
            created_at: row.post.created_at,
            author: AuthorView::from(row.profiles),
        }
    }
}

/// Full single-post view.
#[derive(Debug, Serialize)]
pub struct PostView {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub cover_image_url: Option<String>,
    pub video_links: Vec<String>,
    pub published: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
    pub author: AuthorView,
}

impl From<PostWithAuthor> for PostView {
    fn from(row: PostWithAuthor) -> Self {
        Self {
            id: row.post.id,
            title: row.post.title,
            content: row.post.content,
            cover_image_url: row.post.cover_image_url,
            video_links: row.post.video_links.unwrap_or_default(),
            published: row.post.published,
            created_at: row.post.created_at,
            updated_at: row.post.updated_at,
            author: AuthorView::from(row.profiles),
        }
    }
}

/// Prefill data for the edit form.
#[derive(Debug, Serialize)]
pub struct EditPostView {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub cover_image_url: Option<String>,
    pub video_links: Vec<String>,
    pub published: bool,
}

impl From<Post> for EditPostView {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            title: post.title,
            content: post.content,
            cover_image_url: post.cover_image_url,
            video_links: post.video_links.unwrap_or_default(),
            published: post.published,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HomeView {
    pub posts: Vec<PostCard>,
}

#[derive(Debug, Serialize)]
pub struct DashboardView {
    pub posts: Vec<PostSummary>,
}

#[derive(Debug, Deserialize)]
pub struct EditPostForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub action: String,
}

/// Outcome of a post creation; the warning is set when the cover image
/// upload failed without failing the post.
#[derive(Debug, Serialize)]
pub struct CreatedPostResponse {
    pub id: Uuid,
    pub message: String,
    pub redirect: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[cfg(test)]
mod dto_tests {
    use super::*;
    use time::macros::datetime;

    fn post() -> Post {
        Post {
            id: Uuid::new_v4(),
            author_id: "a-1".into(),
            title: "T".into(),
            content: "C".into(),
            cover_image_url: None,
            video_links: None,
            published: true,
            created_at: datetime!(2024-05-01 10:00 UTC),
            updated_at: None,
        }
    }

    #[test]
    fn missing_author_embed_renders_unknown_user() {
        let view = PostView::from(PostWithAuthor {
            post: post(),
            profiles: None,
        });
        assert_eq!(view.author.first_name, "Unknown");
        assert_eq!(view.author.last_name, "User");
        assert!(view.video_links.is_empty());
    }

    #[test]
    fn present_author_embed_is_carried_through() {
        let card = PostCard::from(PostWithAuthor {
            post: post(),
            profiles: Some(AuthorName {
                first_name: Some("Ada".into()),
                last_name: Some("Lovelace".into()),
            }),
        });
        assert_eq!(card.author.first_name, "Ada");
        assert_eq!(card.author.last_name, "Lovelace");
    }
}
