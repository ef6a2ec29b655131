use crate::error::{Error, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

/// One media upload attempt, ready to go over the wire. The raw bytes are
/// read fresh for every attempt; nothing holds the file open between
/// retries.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Stop id, or the literal `cover` for cover images.
    pub stop_id: String,
    pub media_id: String,
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// The network seam of the upload worker. Production goes through
/// [`WebhookTransport`]; tests swap in a scripted implementation.
#[async_trait]
pub trait MediaTransport: Send + Sync {
    /// Perform one upload attempt. Returns the parsed response body, or
    /// `Value::Null` when the endpoint answered 2xx with an empty or
    /// non-JSON body.
    async fn upload(&self, request: UploadRequest) -> Result<Value>;
}

pub struct WebhookTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl WebhookTransport {
    pub fn new(endpoint: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl MediaTransport for WebhookTransport {
    async fn upload(&self, request: UploadRequest) -> Result<Value> {
        // Field order matters to some webhook processors: data fields
        // first, file last.
        let part = reqwest::multipart::Part::bytes(request.bytes)
            .file_name(request.file_name)
            .mime_str(&request.mime_type)?;
        let form = reqwest::multipart::Form::new()
            .text("stopId", request.stop_id)
            .text("mediaId", request.media_id)
            .part("file", part);

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Upload(format!("HTTP Error {}", status.as_u16())));
        }

        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        match serde_json::from_str(&text) {
            Ok(value) => Ok(value),
            Err(_) => {
                log::warn!("Webhook response was not valid JSON: {text}");
                Ok(Value::Null)
            }
        }
    }
}

/// Pull the server-assigned URL out of the two response shapes the webhook
/// is known to produce: a bare object with `fileUrl` (or `url`), or an
/// array whose first element carries `fileUrl`. Anything else is treated as
/// "no remote URL", never as a failed upload.
pub fn remote_url_from_response(body: &Value) -> Option<String> {
    let carrier = match body {
        Value::Array(items) => items.first()?,
        other => other,
    };
    let url = carrier
        .get("fileUrl")
        .or_else(|| carrier.get("url"))
        .and_then(Value::as_str)?;
    Some(url.to_string())
}
