//! Typed entry point to the candidate backend.
//!
//! Views never build paths or touch the transport directly; everything goes through here.

use std::sync::Arc;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::errors::ClientError;
use crate::models::{
    CandidateDetail, CandidateId, CandidateList, CandidateSummary, Channel, DocumentRequestReceipt,
    HealthStatus, RequestDocumentsBody, UploadResult,
};
use crate::transport::{FileSource, ProgressFn, Transport};
use crate::upload::{resume_form, DocumentSubmissionRequest, UploadDecodePolicy, UploadSession};

pub const CANDIDATES_PATH: &str = "/api/candidates";
pub const UPLOAD_PATH: &str = "/api/candidates/upload";
pub const HEALTH_PATH: &str = "/health/";

pub fn candidate_path(id: CandidateId) -> String {
    format!("{CANDIDATES_PATH}/{id}")
}

pub fn request_documents_path(id: CandidateId) -> String {
    format!("{CANDIDATES_PATH}/{id}/request-documents")
}

pub fn submit_documents_path(id: CandidateId) -> String {
    format!("{CANDIDATES_PATH}/{id}/submit-documents")
}

#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    upload_policy: UploadDecodePolicy,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            upload_policy: UploadDecodePolicy::default(),
        }
    }

    /// How every upload from this client treats a 2xx body that is not a JSON object.
    pub fn with_upload_policy(mut self, policy: UploadDecodePolicy) -> Self {
        self.upload_policy = policy;
        self
    }

    fn upload_session(&self, path: impl Into<String>) -> UploadSession {
        UploadSession::new(self.transport.clone(), path).with_policy(self.upload_policy)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let value = self.transport.send(Method::GET, path, None).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// GET /health/
    pub async fn health(&self) -> Result<HealthStatus, ClientError> {
        self.get(HEALTH_PATH).await
    }

    /// GET /api/candidates
    pub async fn list_candidates(&self) -> Result<Vec<CandidateSummary>, ClientError> {
        let list: CandidateList = self.get(CANDIDATES_PATH).await?;
        Ok(list.into_rows())
    }

    /// GET /api/candidates/{id}
    pub async fn get_candidate(&self, id: CandidateId) -> Result<CandidateDetail, ClientError> {
        self.get(&candidate_path(id)).await
    }

    /// POST /api/candidates/upload (multipart `file`)
    pub async fn upload_resume(
        &self,
        file: FileSource,
        progress: Option<ProgressFn>,
    ) -> Result<UploadResult, ClientError> {
        let file = file.load().await?;
        self.upload_session(UPLOAD_PATH)
            .start(resume_form(file), progress)
            .await
    }

    /// POST /api/candidates/{id}/request-documents
    pub async fn request_documents(
        &self,
        id: CandidateId,
        channel: Channel,
    ) -> Result<DocumentRequestReceipt, ClientError> {
        let body: Value = serde_json::to_value(RequestDocumentsBody { channel })?;
        let value = self
            .transport
            .send(Method::POST, &request_documents_path(id), Some(&body))
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    /// POST /api/candidates/{id}/submit-documents (multipart)
    ///
    /// Validation and file reads run before the session exists: with no file selected, or
    /// an unreadable one, nothing is sent.
    pub async fn submit_documents(
        &self,
        id: CandidateId,
        request: DocumentSubmissionRequest,
        progress: Option<ProgressFn>,
    ) -> Result<UploadResult, ClientError> {
        let form = request.into_form().await?;
        self.upload_session(submit_documents_path(id))
            .start(form, progress)
            .await
    }
}
