use std::fmt::Write as _;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use tracing::info;

use crate::action::{ActionPhase, ActionStateMachine};
use crate::api::ApiClient;
use crate::field::{confidence_percent, render, RenderedField, PLACEHOLDER};
use crate::models::{
    display_timestamp, CandidateDetail, CandidateId, Channel, DocumentRequestReceipt,
    DocumentSubmission, ProfileField, UploadResult,
};
use crate::transport::ProgressFn;
use crate::upload::DocumentSubmissionRequest;

use super::progress_bar;

/// One candidate: profile with confidence badges plus the two document actions.
///
/// The two action machines are independent; a failure in one never rewrites the
/// other's message.
pub struct DetailView {
    api: ApiClient,
    id: CandidateId,
    loading: bool,
    error: Option<String>,
    detail: Option<CandidateDetail>,
    request_docs: ActionStateMachine,
    submit_docs: ActionStateMachine,
    upload_progress: Arc<AtomicU8>,
}

impl DetailView {
    pub fn new(api: ApiClient, id: CandidateId) -> Self {
        Self {
            api,
            id,
            loading: true,
            error: None,
            detail: None,
            request_docs: ActionStateMachine::new("request-documents"),
            submit_docs: ActionStateMachine::new("submit-documents"),
            upload_progress: Arc::new(AtomicU8::new(0)),
        }
    }

    /// One-shot refetch. The fetched detail replaces the previous one wholesale.
    pub async fn load(&mut self) {
        match self.api.get_candidate(self.id).await {
            Ok(detail) => {
                self.detail = Some(detail);
                self.error = None;
            }
            Err(e) => self.error = Some(e.to_string()),
        }
        self.loading = false;
    }

    pub async fn request_documents(&mut self, channel: Channel) -> ActionPhase {
        let receipt = self
            .request_docs
            .run(
                "Sending request…",
                self.api.request_documents(self.id, channel),
                |receipt: &DocumentRequestReceipt| {
                    format!("Request sent via {}. Link: {}", receipt.channel, receipt.link)
                },
            )
            .await;
        if let Some(receipt) = receipt {
            info!(
                "document request {:?} for candidate {} is {}; preview: {}",
                receipt.request_id,
                self.id,
                receipt.status.as_deref().unwrap_or("unknown"),
                receipt.message_preview.as_deref().unwrap_or("")
            );
        }
        self.request_docs.phase()
    }

    /// Submits PAN / Aadhaar files; on success the candidate is reloaded. Files given by
    /// path are read inside the action, so an unreadable one ends it as `Failed`.
    pub async fn submit_documents(
        &mut self,
        request: DocumentSubmissionRequest,
        observer: Option<ProgressFn>,
    ) -> ActionPhase {
        self.upload_progress.store(0, Ordering::SeqCst);
        let progress = self.upload_progress.clone();
        let sink: ProgressFn = Arc::new(move |p: u8| {
            progress.store(p, Ordering::SeqCst);
            if let Some(observer) = &observer {
                observer(p);
            }
        });

        let submitted = self
            .submit_docs
            .run(
                "Uploading…",
                self.api.submit_documents(self.id, request, Some(sink)),
                |result: &UploadResult| {
                    describe_submission(&DocumentSubmission::from_result(result))
                },
            )
            .await;

        if let Some(result) = submitted {
            let submission = DocumentSubmission::from_result(&result);
            info!(
                "documents submitted for candidate {} (pan {:?}, aadhaar {:?}); reloading",
                self.id, submission.pan_document_id, submission.aadhaar_document_id
            );
            self.load().await;
        }
        self.submit_docs.phase()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn request_action(&self) -> &ActionStateMachine {
        &self.request_docs
    }

    pub fn submit_action(&self) -> &ActionStateMachine {
        &self.submit_docs
    }

    pub fn upload_progress(&self) -> u8 {
        self.upload_progress.load(Ordering::SeqCst)
    }

    pub fn rendered_fields(&self) -> Vec<(ProfileField, RenderedField)> {
        let Some(detail) = &self.detail else {
            return Vec::new();
        };
        ProfileField::ALL
            .iter()
            .map(|which| (*which, render(detail.profile.field(*which))))
            .collect()
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        if self.loading {
            out.push_str("Loading…\n");
            return out;
        }
        if let Some(error) = &self.error {
            let _ = writeln!(out, "Error: {error}");
        }
        let Some(detail) = &self.detail else {
            return out;
        };

        let _ = write!(out, "Candidate #{}", detail.id);
        if let Some(status) = detail.extraction_status {
            let _ = write!(out, "  [{status}]");
        }
        out.push('\n');

        for (which, field) in self.rendered_fields() {
            let _ = writeln!(
                out,
                "  {:<12} {:<32} {:>4}",
                which.label(),
                field.display_value,
                field.badge()
            );
            if which.is_pii() {
                let _ = writeln!(out, "  {:<12} masked: {}", "", field.masked_line);
            }
        }

        let profile = &detail.profile;
        if profile.skills.is_empty() {
            out.push_str("  Skills       -\n");
        } else {
            let skills: Vec<String> = profile
                .skills
                .iter()
                .map(|s| format!("{} {}%", s.name, confidence_percent(s.confidence)))
                .collect();
            let _ = writeln!(out, "  Skills       {}", skills.join(", "));
        }
        if let Some(created) = &detail.created_at {
            let updated = detail
                .updated_at
                .as_deref()
                .map(display_timestamp)
                .unwrap_or_else(|| PLACEHOLDER.to_string());
            let _ = writeln!(
                out,
                "  Uploaded {}, updated {updated}",
                display_timestamp(created)
            );
        }
        if let Some(model) = &profile.model_name {
            let extracted = profile
                .extracted_at
                .as_deref()
                .map(display_timestamp)
                .unwrap_or_else(|| PLACEHOLDER.to_string());
            let _ = writeln!(out, "  Extracted by {model} at {extracted}");
        }
        for (kind, status) in &detail.documents {
            let state = match (status.present, status.verified) {
                (false, _) => "missing",
                (true, false) => "present, unverified",
                (true, true) => "verified",
            };
            let _ = writeln!(out, "  {kind:<12} {state}");
        }

        if !self.request_docs.message().is_empty() {
            let _ = writeln!(out, "Request documents: {}", self.request_docs.message());
        }
        if self.submit_docs.phase() != ActionPhase::Idle {
            let _ = writeln!(
                out,
                "Submit documents: {} {}",
                progress_bar(self.upload_progress()),
                self.submit_docs.message()
            );
        }
        out
    }
}

fn describe_submission(submission: &DocumentSubmission) -> String {
    match submission.submission_id {
        Some(id) if submission.accepted => format!("Submitted. Submission #{id}"),
        _ => "Submitted.".to_string(),
    }
}
