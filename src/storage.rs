use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;

/// Seam over the remote object store: upload a blob under a key and resolve
/// the public URL it will be served from.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn upload(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<()>;
    fn public_url(&self, key: &str) -> String;
}

pub const BUCKET: &str = "blog-images";

#[derive(Clone)]
pub struct SupabaseStorage {
    http: Client,
    url: String,
    key: String,
    bucket: String,
}

impl SupabaseStorage {
    pub fn new(url: &str, key: &str) -> Self {
        let http = Client::builder()
            .user_agent("blogforge")
            .build()
            .unwrap_or_default();
        Self {
            http,
            url: url.trim_end_matches('/').to_string(),
            key: key.to_string(),
            bucket: BUCKET.to_string(),
        }
    }
}

#[async_trait]
impl ObjectStorage for SupabaseStorage {
    async fn upload(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<()> {
        let endpoint = format!("{}/storage/v1/object/{}/{}", self.url, self.bucket, key);
        let resp = self
            .http
            .post(&endpoint)
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(body)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("storage upload failed with {}: {}", status, body);
        }
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/storage/v1/object/public/{}/{}", self.url, self.bucket, key)
    }
}

#[cfg(test)]
mod storage_tests {
    use super::*;

    #[test]
    fn public_url_points_into_the_bucket() {
        let storage = SupabaseStorage::new("https://proj.supabase.co/", "anon");
        assert_eq!(
            storage.public_url("user-1/abc_cover.png"),
            "https://proj.supabase.co/storage/v1/object/public/blog-images/user-1/abc_cover.png"
        );
    }
}
