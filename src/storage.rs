use anyhow::Context;
use async_trait::async_trait;
use aws_config::{defaults, BehaviorVersion};
use aws_credential_types::Credentials;
use aws_sdk_s3::{
    config::{Builder as S3ConfigBuilder, Region},
    presigning::PresigningConfig,
    Client,
};
use aws_smithy_types::byte_stream::ByteStream;
use bytes::Bytes;
use uuid::Uuid;

pub const MEDIA_URL_TTL_SECS: u64 = 600;

#[async_trait]
pub trait StorageClient: Send + Sync {
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<()>;
    async fn presign_get(&self, key: &str, seconds: u64) -> anyhow::Result<String>;
}

#[derive(Clone)]
pub struct Storage {
    client: Client,
    bucket: String,
}

impl Storage {
    pub async fn new(
        endpoint: &str,
        bucket: &str,
        access_key: &str,
        secret_key: &str,
        region: &str,
    ) -> anyhow::Result<Self> {
        let shared = defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .credentials_provider(Credentials::new(
                access_key, secret_key, None, None, "static",
            ))
            .endpoint_url(endpoint)
            .load()
            .await;

        let conf = S3ConfigBuilder::from(&shared)
            .endpoint_url(endpoint)
            .force_path_style(true)
            .build();

        Ok(Self {
            client: Client::from_conf(conf),
            bucket: bucket.to_string(),
        })
    }
}

#[async_trait]
impl StorageClient for Storage {
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .context("s3 put_object")?;
        Ok(())
    }

    async fn presign_get(&self, key: &str, seconds: u64) -> anyhow::Result<String> {
        let req = self.client.get_object().bucket(&self.bucket).key(key);
        let presigned = req
            .presigned(PresigningConfig::expires_in(
                std::time::Duration::from_secs(seconds),
            )?)
            .await
            .context("s3 presign_get")?;
        Ok(presigned.uri().to_string())
    }
}

/// Classification the capsule logic consumes. Raw bytes never leave this
/// module; downstream code only sees the kind and the storage key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Audio,
    Other,
}

pub fn classify_mime(content_type: &str) -> MediaKind {
    if content_type.starts_with("image/") {
        MediaKind::Image
    } else if content_type.starts_with("audio/") {
        MediaKind::Audio
    } else {
        MediaKind::Other
    }
}

fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/heic" => Some("heic"),
        "image/gif" => Some("gif"),
        "audio/mpeg" => Some("mp3"),
        "audio/mp4" | "audio/x-m4a" => Some("m4a"),
        "audio/aac" => Some("aac"),
        "audio/wav" | "audio/x-wav" => Some("wav"),
        "audio/ogg" => Some("ogg"),
        "audio/webm" => Some("weba"),
        _ => None,
    }
}

#[derive(Debug, Clone)]
pub struct StoredUpload {
    pub key: String,
    pub kind: MediaKind,
}

/// Store one uploaded file and hand back its classification and key.
pub async fn store_upload(
    storage: &dyn StorageClient,
    owner_id: Uuid,
    body: Bytes,
    content_type: &str,
) -> anyhow::Result<StoredUpload> {
    let kind = classify_mime(content_type);
    let ext = ext_from_mime(content_type).unwrap_or("bin");
    let key = format!("capsules/{}/{}.{}", owner_id, Uuid::new_v4(), ext);
    storage
        .put_object(&key, body, content_type)
        .await
        .with_context(|| format!("put_object {}", key))?;
    Ok(StoredUpload { key, kind })
}

#[cfg(test)]
mod storage_tests {
    use super::*;
    use crate::state::AppState;

    #[test]
    fn test_classify_mime() {
        assert_eq!(classify_mime("image/jpeg"), MediaKind::Image);
        assert_eq!(classify_mime("image/png"), MediaKind::Image);
        assert_eq!(classify_mime("audio/mpeg"), MediaKind::Audio);
        assert_eq!(classify_mime("audio/x-m4a"), MediaKind::Audio);
        assert_eq!(classify_mime("application/pdf"), MediaKind::Other);
        assert_eq!(classify_mime("video/mp4"), MediaKind::Other);
    }

    #[test]
    fn test_ext_from_mime() {
        assert_eq!(ext_from_mime("image/jpeg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/webp"), Some("webp"));
        assert_eq!(ext_from_mime("audio/mpeg"), Some("mp3"));
        assert_eq!(ext_from_mime("audio/wav"), Some("wav"));
        assert_eq!(ext_from_mime("application/octet-stream"), None);
    }

    #[tokio::test]
    async fn test_store_upload_assigns_key_under_owner() {
        let state = AppState::fake();
        let owner = Uuid::new_v4();
        let stored = store_upload(
            state.storage.as_ref(),
            owner,
            Bytes::from_static(b"fake image"),
            "image/png",
        )
        .await
        .unwrap();
        assert_eq!(stored.kind, MediaKind::Image);
        assert!(stored.key.starts_with(&format!("capsules/{}/", owner)));
        assert!(stored.key.ends_with(".png"));

        let url = state.storage.presign_get(&stored.key, 600).await.unwrap();
        assert!(url.contains(&stored.key));
    }
}
