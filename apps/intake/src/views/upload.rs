use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use tracing::info;

use crate::action::{ActionPhase, ActionStateMachine};
use crate::api::ApiClient;
use crate::models::{ResumeUploaded, UploadResult};
use crate::transport::{FileSource, ProgressFn};

use super::progress_bar;

/// Resume upload screen: one action, one progress bar.
pub struct UploadView {
    api: ApiClient,
    action: ActionStateMachine,
    progress: Arc<AtomicU8>,
    last_upload: Option<ResumeUploaded>,
}

impl UploadView {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            action: ActionStateMachine::new("upload-resume"),
            progress: Arc::new(AtomicU8::new(0)),
            last_upload: None,
        }
    }

    /// Uploads `file`, reading it first when given by path. `observer` additionally
    /// receives every progress event.
    pub async fn upload(
        &mut self,
        file: impl Into<FileSource>,
        observer: Option<ProgressFn>,
    ) -> ActionPhase {
        let file = file.into();
        self.progress.store(0, Ordering::SeqCst);
        let progress = self.progress.clone();
        let sink: ProgressFn = Arc::new(move |p: u8| {
            progress.store(p, Ordering::SeqCst);
            if let Some(observer) = &observer {
                observer(p);
            }
        });

        let pending = format!("Uploading {}…", file.display_name());
        let upload = self.api.upload_resume(file, Some(sink));
        let result = self
            .action
            .run(pending, upload, |result: &UploadResult| {
                match ResumeUploaded::from_result(result) {
                    Some(uploaded) => {
                        format!("Uploaded. Candidate #{} parsing…", uploaded.candidate_id)
                    }
                    None => "Uploaded.".to_string(),
                }
            })
            .await;

        if let Some(result) = result {
            self.last_upload = ResumeUploaded::from_result(&result);
            if let Some(uploaded) = &self.last_upload {
                info!(
                    "resume {:?} stored for candidate {} ({}): {}",
                    uploaded.resume_id,
                    uploaded.candidate_id,
                    uploaded.status.as_deref().unwrap_or("unknown"),
                    uploaded.message.as_deref().unwrap_or("")
                );
            }
        }
        self.action.phase()
    }

    pub fn action(&self) -> &ActionStateMachine {
        &self.action
    }

    pub fn progress(&self) -> u8 {
        self.progress.load(Ordering::SeqCst)
    }

    pub fn last_upload(&self) -> Option<&ResumeUploaded> {
        self.last_upload.as_ref()
    }

    pub fn render(&self) -> String {
        let status = match self.action.phase() {
            ActionPhase::Pending => format!("Uploading… {}%", self.progress()),
            _ => self.action.message().to_string(),
        };
        format!("Upload Resume\n{}\n{status}\n", progress_bar(self.progress()))
    }
}
