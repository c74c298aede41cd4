//! Object-store adapter. Owns the S3 client, target bucket and the public
//! base URL; constructed once at startup and passed into handlers through
//! shared state.

use aws_sdk_s3::primitives::ByteStream;
use thiserror::Error;
use uuid::Uuid;

use crate::config::StorageConfig;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("upload failed: {0}")]
    Upload(String),

    #[error("delete failed: {0}")]
    Delete(String),
}

pub struct ObjectStore {
    client: aws_sdk_s3::Client,
    bucket: String,
    public_base_url: String,
}

impl ObjectStore {
    pub async fn connect(config: &StorageConfig) -> Self {
        let shared = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(config.region.clone()))
            .load()
            .await;
        Self {
            client: aws_sdk_s3::Client::new(&shared),
            bucket: config.bucket.clone(),
            public_base_url: config.public_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Upload bytes under `key` and return the public URL.
    pub async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| StorageError::Upload(e.to_string()))?;
        tracing::debug!(key = %key, "uploaded object");
        Ok(self.public_url(key))
    }

    pub async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::Delete(e.to_string()))?;
        tracing::debug!(key = %key, "deleted object");
        Ok(())
    }

    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key)
    }
}

/// Key for a transcoded image upload.
pub fn image_key(folder: &str, prefix: &str) -> String {
    format!("{}/{}.jpg", folder, key_stem(prefix))
}

/// Key for an audio upload; the original file name rides along so the
/// stored object stays recognizable.
pub fn audio_key(folder: &str, prefix: &str, original_name: &str) -> String {
    format!("{}/{}-{}", folder, key_stem(prefix), original_name)
}

fn key_stem(prefix: &str) -> String {
    format!(
        "{}-{}-{}",
        prefix,
        Uuid::new_v4(),
        chrono::Utc::now().timestamp_millis()
    )
}

/// Recover the stored key from a previously returned public URL by locating
/// the `{prefix}-` marker in the URL path. Returns `None` when the URL does
/// not parse or carries no marker.
pub fn key_from_url(file_url: &str, folder: &str, prefix: &str) -> Option<String> {
    let url = url::Url::parse(file_url).ok()?;
    let path = url.path();
    let marker = format!("{}-", prefix);
    let start = path.find(&marker)?;
    Some(format!("{}/{}", folder, &path[start..]))
}
