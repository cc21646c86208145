use std::time::Duration;

use async_trait::async_trait;

use super::ProviderError;

/// Blob storage for uploaded audio journals.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), ProviderError>;

    fn public_url(&self, path: &str) -> String;
}

/// Supabase Storage bucket, written with the service-role key.
pub struct SupabaseStorage {
    http: reqwest::Client,
    base_url: String,
    service_key: String,
    bucket: String,
}

impl SupabaseStorage {
    pub fn new(base_url: &str, service_key: &str, bucket: &str) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key: service_key.to_string(),
            bucket: bucket.to_string(),
        })
    }
}

#[async_trait]
impl ObjectStore for SupabaseStorage {
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), ProviderError> {
        let response = self
            .http
            .post(format!(
                "{}/storage/v1/object/{}/{}",
                self.base_url, self.bucket, path
            ))
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
            .header("content-type", content_type)
            .header("x-upsert", "false")
            .body(bytes)
            .send()
            .await?;

        if response.status().is_success() {
            return Ok(());
        }

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        match status {
            401 | 403 => Err(ProviderError::Unauthorized(body)),
            _ => Err(ProviderError::Status { status, body }),
        }
    }

    fn public_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url, self.bucket, path
        )
    }
}

/// Extension for an uploaded file name, defaulting to `mp3`.
pub fn audio_extension(filename: Option<&str>) -> String {
    filename
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.trim().to_ascii_lowercase())
        .filter(|ext| {
            !ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .unwrap_or_else(|| "mp3".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_url() {
        let storage =
            SupabaseStorage::new("https://x.supabase.co/", "key", "audio-journal").unwrap();
        assert_eq!(
            storage.public_url("u/1.webm"),
            "https://x.supabase.co/storage/v1/object/public/audio-journal/u/1.webm"
        );
    }

    #[test]
    fn test_audio_extension() {
        assert_eq!(audio_extension(Some("memo.WEBM")), "webm");
        assert_eq!(audio_extension(Some("voice.note.m4a")), "m4a");
        assert_eq!(audio_extension(Some("no-extension")), "mp3");
        assert_eq!(audio_extension(Some("bad.../etc")), "mp3");
        assert_eq!(audio_extension(None), "mp3");
    }
}
