use anyhow::Context;
use bytes::Bytes;
use uuid::Uuid;

use crate::storage::ObjectStorage;

/// Cover images are the only accepted upload.
pub const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];

fn extension(filename: &str) -> Option<String> {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .filter(|ext| !ext.is_empty())
}

pub fn allowed_file(filename: &str) -> bool {
    extension(filename)
        .map(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// Drops any path components and replaces everything outside
/// `[A-Za-z0-9._-]`, so the key is safe to hand to the object store.
pub fn sanitize_filename(filename: &str) -> String {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = cleaned.trim_start_matches(['.', '_', '-']);
    if trimmed.is_empty() {
        "file".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Upload keys are namespaced by author and made unique per upload so
/// users cannot collide with each other or themselves.
pub fn object_key(author_id: &str, filename: &str) -> String {
    format!("{}/{}_{}", author_id, Uuid::new_v4(), sanitize_filename(filename))
}

pub fn content_type_for(filename: &str) -> &'static str {
    match extension(filename).as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

/// Uploads the blob and resolves its public URL.
pub async fn upload_cover_image(
    storage: &dyn ObjectStorage,
    author_id: &str,
    filename: &str,
    data: Bytes,
) -> anyhow::Result<String> {
    let key = object_key(author_id, filename);
    storage
        .upload(&key, data, content_type_for(filename))
        .await
        .with_context(|| format!("upload {}", key))?;
    Ok(storage.public_url(&key))
}

#[cfg(test)]
mod upload_tests {
    use super::*;
    use async_trait::async_trait;

    #[test]
    fn allow_list_is_exact() {
        assert!(allowed_file("cover.png"));
        assert!(allowed_file("photo.JPG"));
        assert!(allowed_file("a.b.jpeg"));
        assert!(allowed_file("anim.gif"));
        assert!(allowed_file("img.webp"));
        assert!(!allowed_file("doc.pdf"));
        assert!(!allowed_file("archive.tar.gz"));
        assert!(!allowed_file("noextension"));
        assert!(!allowed_file("trailingdot."));
    }

    #[test]
    fn filenames_lose_paths_and_odd_characters() {
        assert_eq!(sanitize_filename("cover.png"), "cover.png");
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\photos\\me.png"), "me.png");
        assert_eq!(sanitize_filename("my photo (1).png"), "my_photo__1_.png");
        assert_eq!(sanitize_filename(".hidden.png"), "hidden.png");
        assert_eq!(sanitize_filename("???"), "file");
    }

    #[test]
    fn object_keys_are_namespaced_by_author() {
        let key = object_key("user-42", "cover.png");
        assert!(key.starts_with("user-42/"));
        assert!(key.ends_with("_cover.png"));
    }

    #[test]
    fn content_types_follow_the_extension() {
        assert_eq!(content_type_for("a.png"), "image/png");
        assert_eq!(content_type_for("a.jpg"), "image/jpeg");
        assert_eq!(content_type_for("a.JPEG"), "image/jpeg");
        assert_eq!(content_type_for("a.gif"), "image/gif");
        assert_eq!(content_type_for("a.webp"), "image/webp");
        assert_eq!(content_type_for("a.bin"), "application/octet-stream");
    }

    struct RecordingStorage;

    #[async_trait]
    impl ObjectStorage for RecordingStorage {
        async fn upload(&self, _key: &str, _body: Bytes, _ct: &str) -> anyhow::Result<()> {
            Ok(())
        }
        fn public_url(&self, key: &str) -> String {
            format!("https://cdn.local/{}", key)
        }
    }

    struct BrokenStorage;

    #[async_trait]
    impl ObjectStorage for BrokenStorage {
        async fn upload(&self, _key: &str, _body: Bytes, _ct: &str) -> anyhow::Result<()> {
            anyhow::bail!("bucket gone")
        }
        fn public_url(&self, key: &str) -> String {
            format!("https://cdn.local/{}", key)
        }
    }

    #[tokio::test]
    async fn successful_upload_returns_the_public_url() {
        let url = upload_cover_image(&RecordingStorage, "u1", "cover.png", Bytes::from("img"))
            .await
            .unwrap();
        assert!(url.starts_with("https://cdn.local/u1/"));
        assert!(url.ends_with("_cover.png"));
    }

    #[tokio::test]
    async fn failed_upload_carries_the_key_in_context() {
        let err = upload_cover_image(&BrokenStorage, "u1", "cover.png", Bytes::from("img"))
            .await
            .unwrap_err();
        assert!(format!("{:#}", err).contains("bucket gone"));
    }
}
