//! One multipart submission with progress and a terminal result.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::errors::ClientError;
use crate::models::UploadResult;
use crate::transport::{FilePart, FileSource, MultipartPayload, ProgressFn, Transport};

/// Multipart field name for the resume file.
pub const RESUME_FIELD: &str = "file";
pub const PAN_FILE_FIELD: &str = "pan_file";
pub const AADHAAR_FILE_FIELD: &str = "aadhaar_file";
pub const PAN_NUMBER_FIELD: &str = "pan_number";
pub const AADHAAR_NUMBER_FIELD: &str = "aadhaar_number";

pub const NO_DOCUMENT_MESSAGE: &str =
    "Select at least one file (PAN or Aadhaar) before uploading.";

/// What to do with a 2xx upload response whose body is not a JSON object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UploadDecodePolicy {
    /// Resolve with an empty result: a decode problem must not mask a successful upload.
    #[default]
    EmptyOnInvalidBody,
    /// Fail with `ClientError::Decode`.
    Strict,
}

pub fn decode_upload_body(
    body: &[u8],
    policy: UploadDecodePolicy,
) -> Result<UploadResult, ClientError> {
    match serde_json::from_slice::<serde_json::Value>(body) {
        Ok(serde_json::Value::Object(map)) => Ok(map),
        Ok(other) => match policy {
            UploadDecodePolicy::EmptyOnInvalidBody => {
                warn!("upload response was JSON but not an object ({other}); using empty result");
                Ok(UploadResult::new())
            }
            UploadDecodePolicy::Strict => Err(ClientError::Decode(format!(
                "expected a JSON object, got {other}"
            ))),
        },
        Err(e) => match policy {
            UploadDecodePolicy::EmptyOnInvalidBody => {
                warn!("upload response body is not JSON ({e}); using empty result");
                Ok(UploadResult::new())
            }
            UploadDecodePolicy::Strict => Err(e.into()),
        },
    }
}

/// Builder for one multipart payload. Optional parts are appended only when present:
/// files when `Some`, text when non-empty after trimming.
#[derive(Debug, Clone, Default)]
pub struct UploadForm {
    payload: MultipartPayload,
}

impl UploadForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file(mut self, name: &str, file: Option<FilePart>) -> Self {
        if let Some(file) = file {
            self.payload.push_file(name, file);
        }
        self
    }

    pub fn text(mut self, name: &str, value: Option<&str>) -> Self {
        if let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) {
            self.payload.push_text(name, value.to_string());
        }
        self
    }

    pub fn into_payload(self) -> MultipartPayload {
        self.payload
    }
}

pub fn resume_form(file: FilePart) -> UploadForm {
    UploadForm::new().file(RESUME_FIELD, Some(file))
}

/// PAN / Aadhaar submission. At least one of the two files is required.
#[derive(Debug, Clone, Default)]
pub struct DocumentSubmissionRequest {
    pub pan_file: Option<FileSource>,
    pub aadhaar_file: Option<FileSource>,
    pub pan_number: Option<String>,
    pub aadhaar_number: Option<String>,
}

impl DocumentSubmissionRequest {
    pub fn validate(&self) -> Result<(), ClientError> {
        if self.pan_file.is_none() && self.aadhaar_file.is_none() {
            return Err(ClientError::Validation(NO_DOCUMENT_MESSAGE.to_string()));
        }
        Ok(())
    }

    /// Validates, then reads any file given by path. PAN numbers are upper-cased,
    /// matching how the PAN format is written.
    pub async fn into_form(self) -> Result<UploadForm, ClientError> {
        self.validate()?;
        let pan_file = load_optional(self.pan_file).await?;
        let aadhaar_file = load_optional(self.aadhaar_file).await?;
        let pan_number = self.pan_number.map(|n| n.trim().to_uppercase());
        Ok(UploadForm::new()
            .file(PAN_FILE_FIELD, pan_file)
            .file(AADHAAR_FILE_FIELD, aadhaar_file)
            .text(PAN_NUMBER_FIELD, pan_number.as_deref())
            .text(AADHAAR_NUMBER_FIELD, self.aadhaar_number.as_deref()))
    }
}

async fn load_optional(source: Option<FileSource>) -> Result<Option<FilePart>, ClientError> {
    match source {
        Some(source) => Ok(Some(source.load().await?)),
        None => Ok(None),
    }
}

/// One binary submission to `path`. Consumed by `start`.
pub struct UploadSession {
    transport: Arc<dyn Transport>,
    path: String,
    policy: UploadDecodePolicy,
}

impl UploadSession {
    pub fn new(transport: Arc<dyn Transport>, path: impl Into<String>) -> Self {
        Self {
            transport,
            path: path.into(),
            policy: UploadDecodePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: UploadDecodePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sends the form. Progress events (if any) all arrive before this resolves.
    pub async fn start(
        self,
        form: UploadForm,
        progress: Option<ProgressFn>,
    ) -> Result<UploadResult, ClientError> {
        let payload = form.into_payload();
        debug!(
            "upload to {} with fields {:?} ({} file bytes)",
            self.path,
            payload.field_names(),
            payload.file_bytes()
        );
        let body = self.transport.upload(&self.path, payload, progress).await?;
        decode_upload_body(&body, self.policy)
    }
}
