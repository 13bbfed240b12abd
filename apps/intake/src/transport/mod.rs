//! One HTTP request/response exchange, JSON or multipart.
//!
//! No retries anywhere in here: one call, one attempt. Retrying is a repeated user action.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Method;
use serde_json::Value;

use crate::errors::ClientError;

mod http;
mod multipart;
mod progress;
#[cfg(test)]
pub mod testing;

pub use http::HttpTransport;
pub use multipart::{FilePart, FileSource, FormField, MultipartPayload};
pub use progress::ProgressTracker;

/// Progress sink for uploads. Receives integer percentages in `[0, 100]`, non-decreasing.
pub type ProgressFn = Arc<dyn Fn(u8) + Send + Sync>;

/// The exchange seam. `ApiClient` and `UploadSession` only ever talk to this trait,
/// so tests can swap in a recording double and count network calls.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends an optional JSON body and returns the parsed JSON response on any 2xx status.
    /// An empty 2xx body yields `Value::Null`.
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, ClientError>;

    /// Sends a multipart body and returns the raw 2xx response body, undecoded.
    /// Decoding policy belongs to the caller (see `upload::decode_upload_body`).
    async fn upload(
        &self,
        path: &str,
        payload: MultipartPayload,
        progress: Option<ProgressFn>,
    ) -> Result<Bytes, ClientError>;
}
