use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::api::ApiClient;
use crate::errors::ClientError;
use crate::field::PLACEHOLDER;
use crate::models::{display_timestamp, CandidateSummary};
use crate::poll::{PollHandle, PollSession};

#[derive(Debug, Clone, Default)]
pub struct DashboardState {
    pub rows: Vec<CandidateSummary>,
    pub loading: bool,
    pub error: Option<String>,
}

/// Candidate list kept fresh by a standing poll session.
pub struct DashboardView {
    state: watch::Receiver<DashboardState>,
    poll: Option<PollHandle>,
}

impl DashboardView {
    /// Starts polling immediately. Each delivery replaces the row list wholesale.
    pub fn mount(api: ApiClient, interval: Duration) -> Self {
        let (tx, rx) = watch::channel(DashboardState {
            loading: true,
            ..Default::default()
        });
        let tx = Arc::new(tx);
        let result_tx = tx.clone();
        let error_tx = tx;

        let poll = PollSession::open(
            move || {
                let api = api.clone();
                async move { api.list_candidates().await }
            },
            interval,
            Arc::new(move |rows: Vec<CandidateSummary>| {
                result_tx.send_modify(|state| {
                    state.rows = rows;
                    state.loading = false;
                    state.error = None;
                });
            }),
            Arc::new(move |e: ClientError| {
                error_tx.send_modify(|state| {
                    state.loading = false;
                    state.error = Some(e.to_string());
                });
            }),
        );

        Self {
            state: rx,
            poll: Some(poll),
        }
    }

    pub fn snapshot(&self) -> DashboardState {
        self.state.borrow().clone()
    }

    /// Waits for the next delivered poll result. Returns `false` once unmounted.
    pub async fn changed(&mut self) -> bool {
        if !self.is_mounted() {
            return false;
        }
        self.state.changed().await.is_ok()
    }

    pub fn is_mounted(&self) -> bool {
        self.poll.as_ref().is_some_and(PollHandle::is_active)
    }

    pub fn unmount(&mut self) {
        if let Some(mut poll) = self.poll.take() {
            poll.close();
        }
    }

    pub fn render(&self) -> String {
        render_dashboard(&self.snapshot())
    }
}

pub fn render_dashboard(state: &DashboardState) -> String {
    let mut out = String::from("Candidates\n");
    if state.loading {
        out.push_str("Loading…\n");
    }
    if let Some(error) = &state.error {
        let _ = writeln!(out, "Error: {error}");
    }
    if state.loading {
        return out;
    }

    let _ = writeln!(
        out,
        "{:<6} {:<24} {:<28} {:<16} {:<20} {:<10} {}",
        "ID", "Name", "Email (masked)", "Phone (masked)", "Company", "Status", "Uploaded"
    );
    for row in &state.rows {
        let _ = writeln!(
            out,
            "{:<6} {:<24} {:<28} {:<16} {:<20} {:<10} {}",
            row.id,
            row.name.as_deref().unwrap_or(PLACEHOLDER),
            row.email.as_deref().unwrap_or(PLACEHOLDER),
            row.phone.as_deref().unwrap_or(PLACEHOLDER),
            row.latest_company.as_deref().unwrap_or(PLACEHOLDER),
            row.extraction_status,
            row.created_at
                .as_deref()
                .map(display_timestamp)
                .unwrap_or_else(|| PLACEHOLDER.to_string()),
        );
    }
    out
}
