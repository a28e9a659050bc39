use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use time::OffsetDateTime;
use tracing::debug;
use uuid::Uuid;

/// Typed failure for any call against the remote data/auth service.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("upstream returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected response shape: {0}")]
    Decode(String),
}

impl GatewayError {
    /// The auth service reports an existing account only through its error
    /// text. The matched substrings are part of this client's contract.
    pub fn is_duplicate_email(&self) -> bool {
        match self {
            GatewayError::Status { body, .. } => {
                let lower = body.to_lowercase();
                lower.contains("already registered")
                    || lower.contains("already been registered")
                    || lower.contains("already exists")
            }
            _ => false,
        }
    }
}

/// User identity as reported by the auth service.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthIdentity {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Result of a password sign-in; the access token is kept in the session
/// for the later best-effort sign-out.
#[derive(Debug, Clone, Deserialize)]
pub struct SignInSession {
    pub access_token: String,
    pub user: AuthIdentity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub cover_image_url: Option<String>,
    #[serde(default)]
    pub video_links: Option<Vec<String>>,
    pub published: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
}

/// Author columns embedded by `select=*,profiles(first_name,last_name)`.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthorName {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PostWithAuthor {
    #[serde(flatten)]
    pub post: Post,
    #[serde(default)]
    pub profiles: Option<AuthorName>,
}

#[derive(Debug, Serialize)]
pub struct NewPost {
    pub author_id: String,
    pub title: String,
    pub content: String,
    pub video_links: Vec<String>,
    pub cover_image_url: Option<String>,
    pub published: bool,
}

#[derive(Debug, Serialize)]
pub struct PostChanges {
    pub title: String,
    pub content: String,
    pub published: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Serialize)]
pub struct NewProfile {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_admin: bool,
}

#[derive(Debug, Deserialize)]
struct AuthorIdRow {
    author_id: String,
}

/// Thin typed client for the remote data/auth service. Privilege level is
/// decided by the key it is constructed with: the anon key is subject to
/// row-level policies, the service-role key bypasses them.
#[derive(Clone)]
pub struct Supabase {
    http: Client,
    url: String,
    key: String,
}

impl Supabase {
    pub fn new(url: &str, key: &str) -> Self {
        let http = Client::builder()
            .user_agent("blogforge")
            .build()
            .unwrap_or_default();
        Self {
            http,
            url: url.trim_end_matches('/').to_string(),
            key: key.to_string(),
        }
    }

    fn rest(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.url, table)
    }

    fn auth(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.url, path)
    }

    async fn check(resp: reqwest::Response) -> Result<reqwest::Response, GatewayError> {
        let status = resp.status();
        if status.is_success() {
            Ok(resp)
        } else {
            let body = resp.text().await.unwrap_or_default();
            Err(GatewayError::Status {
                status: status.as_u16(),
                body,
            })
        }
    }

    // --- auth operations ---

    /// Creates an identity; the profile row is created by a database trigger
    /// on the remote side, fed from the metadata sent here.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<AuthIdentity, GatewayError> {
        let resp = self
            .http
            .post(self.auth("signup"))
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
            .json(&json!({
                "email": email,
                "password": password,
                "data": { "first_name": first_name, "last_name": last_name },
            }))
            .send()
            .await?;
        let body: Value = Self::check(resp).await?.json().await?;

        // The auth service answers with either the bare user object or a
        // session wrapping one, depending on whether confirmations are on.
        let user = if body.get("user").map_or(false, Value::is_object) {
            body["user"].clone()
        } else {
            body
        };
        serde_json::from_value(user).map_err(|e| GatewayError::Decode(e.to_string()))
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<SignInSession, GatewayError> {
        let resp = self
            .http
            .post(self.auth("token"))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        let session: SignInSession = Self::check(resp).await?.json().await?;
        debug!(user_id = %session.user.id, "signed in");
        Ok(session)
    }

    pub async fn sign_out(&self, access_token: &str) -> Result<(), GatewayError> {
        let resp = self
            .http
            .post(self.auth("logout"))
            .header("apikey", &self.key)
            .bearer_auth(access_token)
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }

    /// Requires the service-role key.
    pub async fn admin_create_user(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthIdentity, GatewayError> {
        let resp = self
            .http
            .post(self.auth("admin/users"))
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
            .json(&json!({
                "email": email,
                "password": password,
                "email_confirm": true,
            }))
            .send()
            .await?;
        let user: Value = Self::check(resp).await?.json().await?;
        serde_json::from_value(user).map_err(|e| GatewayError::Decode(e.to_string()))
    }

    /// Requires the service-role key. The remote cascade removes the profile
    /// and the user's posts.
    pub async fn admin_delete_user(&self, user_id: &str) -> Result<(), GatewayError> {
        let resp = self
            .http
            .delete(self.auth(&format!("admin/users/{}", user_id)))
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }

    // --- profiles ---

    pub async fn profile_by_id(&self, id: &str) -> Result<Option<Profile>, GatewayError> {
        let id_filter = format!("eq.{}", id);
        let resp = self
            .http
            .get(self.rest("profiles"))
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
            .query(&[("select", "*"), ("id", id_filter.as_str())])
            .send()
            .await?;
        let mut rows: Vec<Profile> = Self::check(resp).await?.json().await?;
        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.remove(0))
        })
    }

    pub async fn list_profiles(&self) -> Result<Vec<Profile>, GatewayError> {
        let resp = self
            .http
            .get(self.rest("profiles"))
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
            .query(&[("select", "*")])
            .send()
            .await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    pub async fn insert_profile(&self, profile: &NewProfile) -> Result<(), GatewayError> {
        let resp = self
            .http
            .post(self.rest("profiles"))
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
            .json(profile)
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }

    pub async fn delete_profile(&self, id: &str) -> Result<(), GatewayError> {
        let id_filter = format!("eq.{}", id);
        let resp = self
            .http
            .delete(self.rest("profiles"))
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
            .query(&[("id", id_filter.as_str())])
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }

    // --- posts ---

    pub async fn list_published_posts(&self) -> Result<Vec<PostWithAuthor>, GatewayError> {
        let resp = self
            .http
            .get(self.rest("blog_posts"))
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
            .query(&[
                ("select", "*,profiles(first_name,last_name)"),
                ("published", "eq.true"),
                ("order", "created_at.desc"),
            ])
            .send()
            .await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    pub async fn list_posts_by_author(&self, author_id: &str) -> Result<Vec<Post>, GatewayError> {
        let author_filter = format!("eq.{}", author_id);
        let resp = self
            .http
            .get(self.rest("blog_posts"))
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
            .query(&[
                ("select", "*"),
                ("author_id", author_filter.as_str()),
                ("order", "created_at.desc"),
            ])
            .send()
            .await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    pub async fn list_all_posts(&self) -> Result<Vec<PostWithAuthor>, GatewayError> {
        let resp = self
            .http
            .get(self.rest("blog_posts"))
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
            .query(&[
                ("select", "*,profiles(first_name,last_name)"),
                ("order", "created_at.desc"),
            ])
            .send()
            .await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    pub async fn post_with_author(&self, id: Uuid) -> Result<Option<PostWithAuthor>, GatewayError> {
        let id_filter = format!("eq.{}", id);
        let resp = self
            .http
            .get(self.rest("blog_posts"))
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
            .query(&[
                ("select", "*,profiles(first_name,last_name)"),
                ("id", id_filter.as_str()),
            ])
            .send()
            .await?;
        let mut rows: Vec<PostWithAuthor> = Self::check(resp).await?.json().await?;
        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.remove(0))
        })
    }

    /// Scoped lookup: a post that exists but belongs to someone else comes
    /// back as `None`, exactly like a missing one.
    pub async fn post_for_author(
        &self,
        id: Uuid,
        author_id: &str,
    ) -> Result<Option<Post>, GatewayError> {
        let id_filter = format!("eq.{}", id);
        let author_filter = format!("eq.{}", author_id);
        let resp = self
            .http
            .get(self.rest("blog_posts"))
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
            .query(&[
                ("select", "*"),
                ("id", id_filter.as_str()),
                ("author_id", author_filter.as_str()),
            ])
            .send()
            .await?;
        let mut rows: Vec<Post> = Self::check(resp).await?.json().await?;
        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.remove(0))
        })
    }

    pub async fn post_author_id(&self, id: Uuid) -> Result<Option<String>, GatewayError> {
        let id_filter = format!("eq.{}", id);
        let resp = self
            .http
            .get(self.rest("blog_posts"))
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
            .query(&[("select", "author_id"), ("id", id_filter.as_str())])
            .send()
            .await?;
        let rows: Vec<AuthorIdRow> = Self::check(resp).await?.json().await?;
        Ok(rows.into_iter().next().map(|r| r.author_id))
    }

    pub async fn insert_post(&self, post: &NewPost) -> Result<Post, GatewayError> {
        let resp = self
            .http
            .post(self.rest("blog_posts"))
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
            .header("Prefer", "return=representation")
            .json(post)
            .send()
            .await?;
        let mut rows: Vec<Post> = Self::check(resp).await?.json().await?;
        if rows.is_empty() {
            return Err(GatewayError::Decode("insert returned no row".into()));
        }
        Ok(rows.remove(0))
    }

    pub async fn update_post(
        &self,
        id: Uuid,
        author_id: &str,
        changes: &PostChanges,
    ) -> Result<(), GatewayError> {
        let id_filter = format!("eq.{}", id);
        let author_filter = format!("eq.{}", author_id);
        let resp = self
            .http
            .patch(self.rest("blog_posts"))
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
            .query(&[
                ("id", id_filter.as_str()),
                ("author_id", author_filter.as_str()),
            ])
            .json(changes)
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }

    pub async fn delete_post(&self, id: Uuid) -> Result<(), GatewayError> {
        let id_filter = format!("eq.{}", id);
        let resp = self
            .http
            .delete(self.rest("blog_posts"))
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
            .query(&[("id", id_filter.as_str())])
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }

    pub async fn delete_posts_by_author(&self, author_id: &str) -> Result<(), GatewayError> {
        let author_filter = format!("eq.{}", author_id);
        let resp = self
            .http
            .delete(self.rest("blog_posts"))
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
            .query(&[("author_id", author_filter.as_str())])
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }

    // --- one-time codes ---

    /// The verification flow that would issue these codes is dormant; the
    /// table is still cleared when an account is removed.
    pub async fn delete_otps_for_user(&self, user_id: &str) -> Result<(), GatewayError> {
        let user_filter = format!("eq.{}", user_id);
        let resp = self
            .http
            .delete(self.rest("user_otp"))
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
            .query(&[("user_id", user_filter.as_str())])
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }
}

#[cfg(test)]
mod gateway_tests {
    use super::*;

    #[test]
    fn duplicate_email_is_detected_from_error_text() {
        let dup = GatewayError::Status {
            status: 422,
            body: r#"{"msg":"User already registered"}"#.into(),
        };
        assert!(dup.is_duplicate_email());

        let dup2 = GatewayError::Status {
            status: 400,
            body: "A user with this email address has already been registered".into(),
        };
        assert!(dup2.is_duplicate_email());

        let other = GatewayError::Status {
            status: 500,
            body: "internal error".into(),
        };
        assert!(!other.is_duplicate_email());

        let decode = GatewayError::Decode("bad shape".into());
        assert!(!decode.is_duplicate_email());
    }

    #[test]
    fn post_row_deserializes_with_embedded_author() {
        let raw = r#"{
            "id": "4f9c2d6e-8a1b-4c3d-9e5f-7a8b9c0d1e2f",
            "author_id": "c0ffee00-1234-5678-9abc-def012345678",
            "title": "Hello",
            "content": "World",
            "cover_image_url": null,
            "video_links": ["https://example.com/v"],
            "published": true,
            "created_at": "2024-05-01T10:20:30.123456+00:00",
            "updated_at": null,
            "profiles": {"first_name": "Ada", "last_name": "Lovelace"}
        }"#;
        let row: PostWithAuthor = serde_json::from_str(raw).unwrap();
        assert_eq!(row.post.title, "Hello");
        assert!(row.post.published);
        assert!(row.post.cover_image_url.is_none());
        assert_eq!(row.post.video_links.as_deref(), Some(&["https://example.com/v".to_string()][..]));
        assert_eq!(row.profiles.unwrap().first_name.as_deref(), Some("Ada"));
    }

    #[test]
    fn post_row_tolerates_missing_author_embed() {
        let raw = r#"{
            "id": "4f9c2d6e-8a1b-4c3d-9e5f-7a8b9c0d1e2f",
            "author_id": "abc",
            "title": "T",
            "content": "C",
            "published": false,
            "created_at": "2024-05-01T10:20:30+00:00",
            "profiles": null
        }"#;
        let row: PostWithAuthor = serde_json::from_str(raw).unwrap();
        assert!(row.profiles.is_none());
        assert!(row.post.video_links.is_none());
        assert!(row.post.updated_at.is_none());
    }

    #[test]
    fn sign_in_session_deserializes() {
        let raw = r#"{
            "access_token": "tok",
            "token_type": "bearer",
            "user": {"id": "u-1", "email": "a@b.co"}
        }"#;
        let session: SignInSession = serde_json::from_str(raw).unwrap();
        assert_eq!(session.access_token, "tok");
        assert_eq!(session.user.id, "u-1");
        assert_eq!(session.user.email.as_deref(), Some("a@b.co"));
    }
}
