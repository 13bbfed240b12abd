use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, Method};
use serde_json::Value;
use tracing::{debug, warn};

use super::{FormField, MultipartPayload, ProgressFn, ProgressTracker, Transport};
use crate::errors::ClientError;

/// reqwest-backed transport. Paths are joined onto the configured API origin.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base: String,
}

impl HttpTransport {
    pub fn new(base: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Network(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base: base.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    async fn finish(
        &self,
        method: &Method,
        path: &str,
        response: Result<reqwest::Response, reqwest::Error>,
    ) -> Result<Bytes, ClientError> {
        let response = response.map_err(|e| {
            warn!("{method} {path} did not complete: {e}");
            ClientError::from(e)
        })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| {
            warn!("{method} {path} body read aborted: {e}");
            ClientError::from(e)
        })?;
        debug!("{method} {path} -> {status} ({} bytes)", body.len());

        if !status.is_success() {
            let body = String::from_utf8_lossy(&body).into_owned();
            warn!("{method} {path} returned {status}: {body}");
            return Err(ClientError::Http {
                status: status.as_u16(),
                path: path.to_string(),
                body,
            });
        }

        Ok(body)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, ClientError> {
        let mut request = self.client.request(method.clone(), self.url(path));
        if let Some(body) = body {
            // `.json` sets `content-type: application/json`
            request = request.json(body);
        }

        let bytes = self.finish(&method, path, request.send().await).await?;
        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&bytes).map_err(|e| {
            warn!("{method} {path} returned undecodable JSON: {e}");
            ClientError::Decode(format!("{path}: {e}"))
        })
    }

    async fn upload(
        &self,
        path: &str,
        payload: MultipartPayload,
        progress: Option<ProgressFn>,
    ) -> Result<Bytes, ClientError> {
        let tracker = progress.and_then(|sink| ProgressTracker::new(payload.file_bytes(), sink));

        let mut form = Form::new();
        for field in payload.into_fields() {
            form = match field {
                FormField::Text { name, value } => form.text(name, value),
                FormField::File { name, file } => {
                    let len = file.len();
                    let body = match &tracker {
                        Some(tracker) => Body::wrap_stream(tracker.instrument(file.bytes)),
                        None => Body::from(file.bytes),
                    };
                    let part = Part::stream_with_length(body, len)
                        .file_name(file.file_name)
                        .mime_str(&file.mime)
                        .map_err(|e| {
                            let msg = format!("Invalid content type '{}': {e}", file.mime);
                            ClientError::Validation(msg)
                        })?;
                    form.part(name, part)
                }
            };
        }

        let request = self.client.post(self.url(path)).multipart(form);
        self.finish(&Method::POST, path, request.send().await).await
    }
}
