//! In-process candidate backend for driving the real HTTP transport in tests.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::task::JoinHandle;

#[derive(Debug, Clone)]
pub struct ReceivedUpload {
    pub path: String,
    /// `(field name, byte length)` in arrival order.
    pub fields: Vec<(String, usize)>,
}

#[derive(Clone, Default)]
struct FakeState {
    uploads: Arc<Mutex<Vec<ReceivedUpload>>>,
    gets: Arc<Mutex<Vec<String>>>,
}

pub struct FakeBackend {
    pub base: String,
    state: FakeState,
    task: JoinHandle<()>,
}

impl FakeBackend {
    pub async fn spawn() -> Self {
        let state = FakeState::default();
        // `/api/candidates/upload` shares the `:id` slot; the handler tells them apart.
        let app = Router::new()
            .route("/health/", get(|| async { Json(json!({"status": "ok"})) }))
            .route("/api/candidates", get(list_candidates))
            .route("/api/candidates/:id", get(get_candidate).post(upload_resume))
            .route("/api/candidates/:id/request-documents", post(request_documents))
            .route("/api/candidates/:id/submit-documents", post(submit_documents))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let task = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base: format!("http://{addr}"),
            state,
            task,
        }
    }

    pub fn uploads(&self) -> Vec<ReceivedUpload> {
        self.state.uploads.lock().unwrap().clone()
    }

    pub fn gets(&self) -> Vec<String> {
        self.state.gets.lock().unwrap().clone()
    }
}

impl Drop for FakeBackend {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn list_candidates(State(state): State<FakeState>) -> Json<Value> {
    state.gets.lock().unwrap().push("/api/candidates".to_string());
    Json(json!({
        "results": [
            {"id": 42, "name": "Jane Doe", "email": "j***@acme.com", "phone": "******3210",
             "latest_company": "Acme", "extraction_status": "PARSED",
             "created_at": "2024-03-05T09:41:12.000000Z"}
        ]
    }))
}

async fn get_candidate(
    State(state): State<FakeState>,
    Path(id): Path<String>,
) -> axum::response::Response {
    state.gets.lock().unwrap().push(format!("/api/candidates/{id}"));
    if id != "42" {
        return (StatusCode::NOT_FOUND, Json(json!({"detail": "Not found."}))).into_response();
    }
    Json(json!({
        "id": 42,
        "extraction_status": "PARSED",
        "profile": {
            "name": {"value": "Jane Doe", "confidence": 0.88},
            "email": {"value": "jane@acme.com", "confidence": 0.95, "masked": "j***@acme.com"},
            "phone": {"value": "+91 98765 43210", "confidence": 0.9, "masked": "******3210"},
            "company": {"value": "Acme", "confidence": 0.6},
            "designation": {"value": "Engineer", "confidence": 0.5},
            "skills": [{"name": "Rust", "confidence": 0.9}, {"name": "SQL", "confidence": 0.4}],
            "model_name": "heuristic-v1",
            "extracted_at": null
        },
        "documents": {
            "PAN": {"present": false, "verified": false},
            "AADHAAR": {"present": false, "verified": false}
        }
    }))
    .into_response()
}

async fn read_fields(mut multipart: Multipart) -> Vec<(String, usize)> {
    let mut fields = Vec::new();
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.unwrap();
        fields.push((name, bytes.len()));
    }
    fields
}

async fn upload_resume(
    State(state): State<FakeState>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> axum::response::Response {
    if id != "upload" {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }
    let fields = read_fields(multipart).await;
    state.uploads.lock().unwrap().push(ReceivedUpload {
        path: "/api/candidates/upload".to_string(),
        fields,
    });
    (
        StatusCode::CREATED,
        Json(json!({"candidate_id": 42, "resume_id": 7, "status": "PARSING",
                    "message": "Resume uploaded; parsing started."})),
    )
        .into_response()
}

async fn request_documents(
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> axum::response::Response {
    match body["channel"].as_str() {
        Some("SMS") => {
            (StatusCode::BAD_GATEWAY, "sms gateway unavailable".to_string()).into_response()
        }
        Some(channel) => (
            StatusCode::CREATED,
            Json(json!({"request_id": 1, "channel": channel, "status": "SENT",
                        "link": format!("http://localhost:8000/portal/upload?t=c{id}"),
                        "message_preview": "Hi"})),
        )
            .into_response(),
        None => (StatusCode::BAD_REQUEST, "channel required".to_string()).into_response(),
    }
}

async fn submit_documents(
    State(state): State<FakeState>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> axum::response::Response {
    let fields = read_fields(multipart).await;
    state.uploads.lock().unwrap().push(ReceivedUpload {
        path: format!("/api/candidates/{id}/submit-documents"),
        fields,
    });
    (StatusCode::CREATED, "submission stored").into_response()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::action::ActionPhase;
    use crate::api::ApiClient;
    use crate::models::{CandidateId, Channel, ProfileField};
    use crate::transport::{FilePart, HttpTransport, ProgressFn};
    use crate::upload::DocumentSubmissionRequest;
    use crate::views::{DashboardView, DetailView, UploadView};

    fn client(backend: &FakeBackend) -> ApiClient {
        let transport = HttpTransport::new(backend.base.clone(), Duration::from_secs(10)).unwrap();
        ApiClient::new(Arc::new(transport))
    }

    #[tokio::test]
    async fn test_upload_then_detail_shows_email_badge() {
        let backend = FakeBackend::spawn().await;
        let api = client(&backend);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink_seen = seen.clone();
        let observer: ProgressFn = Arc::new(move |p: u8| sink_seen.lock().unwrap().push(p));

        let mut upload = UploadView::new(api.clone());
        let resume = FilePart::new("jane.pdf", vec![b'x'; 300_000]);
        assert_eq!(upload.upload(resume, Some(observer)).await, ActionPhase::Succeeded);
        let id = upload.last_upload().unwrap().candidate_id;
        assert_eq!(id, CandidateId(42));

        let seen = seen.lock().unwrap().clone();
        assert!(!seen.is_empty());
        assert!(seen.windows(2).all(|w| w[0] <= w[1]), "{seen:?}");
        assert_eq!(*seen.last().unwrap(), 100);
        assert_eq!(
            backend.uploads()[0].fields,
            vec![("file".to_string(), 300_000)]
        );

        let mut detail = DetailView::new(api, id);
        detail.load().await;
        assert_eq!(backend.gets(), vec!["/api/candidates/42"]);
        let fields = detail.rendered_fields();
        let (_, email) = fields.iter().find(|(f, _)| *f == ProfileField::Email).unwrap();
        assert_eq!(email.badge(), "95%");
        assert!(detail.render().contains("95%"));
    }

    #[tokio::test]
    async fn test_document_actions_over_http() {
        let backend = FakeBackend::spawn().await;
        let mut detail = DetailView::new(client(&backend), CandidateId(42));
        detail.load().await;

        assert_eq!(
            detail.request_documents(Channel::Email).await,
            ActionPhase::Succeeded
        );
        assert_eq!(
            detail.request_action().message(),
            "Request sent via EMAIL. Link: http://localhost:8000/portal/upload?t=c42"
        );

        // The fake answers 201 with a non-JSON body; the upload still counts as done.
        let phase = detail
            .submit_documents(
                DocumentSubmissionRequest {
                    pan_file: Some(FilePart::new("pan.png", vec![1u8; 1024]).into()),
                    aadhaar_file: Some(FilePart::new("aadhaar.pdf", vec![2u8; 2048]).into()),
                    pan_number: Some("abcde1234f".to_string()),
                    aadhaar_number: None,
                },
                None,
            )
            .await;
        assert_eq!(phase, ActionPhase::Succeeded);
        assert_eq!(detail.submit_action().message(), "Submitted.");
        assert_eq!(
            backend.uploads()[0].fields,
            vec![
                ("pan_file".to_string(), 1024),
                ("aadhaar_file".to_string(), 2048),
                ("pan_number".to_string(), 10),
            ]
        );
        // initial load plus the post-submit refetch
        assert_eq!(backend.gets().len(), 2);

        assert_eq!(detail.request_documents(Channel::Sms).await, ActionPhase::Failed);
        assert!(detail.request_action().message().contains("502"));
        assert_eq!(detail.submit_action().phase(), ActionPhase::Succeeded);
        assert_eq!(detail.submit_action().message(), "Submitted.");
    }

    #[tokio::test]
    async fn test_unknown_candidate_is_http_error() {
        let backend = FakeBackend::spawn().await;
        let mut detail = DetailView::new(client(&backend), CandidateId(9));
        detail.load().await;
        let error = detail.error().unwrap();
        assert!(error.contains("/api/candidates/9 failed: 404"), "{error}");
    }

    #[tokio::test]
    async fn test_dashboard_polls_over_http() {
        let backend = FakeBackend::spawn().await;
        let mut dashboard = DashboardView::mount(client(&backend), Duration::from_millis(50));
        assert!(dashboard.changed().await);
        let state = dashboard.snapshot();
        assert_eq!(state.rows.len(), 1);
        assert!(dashboard.render().contains("2024-03-05 09:41"));

        dashboard.unmount();
        // let a fetch that was already on the wire land first
        tokio::time::sleep(Duration::from_millis(30)).await;
        let polled = backend.gets().len();
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(backend.gets().len(), polled);
    }

    #[tokio::test]
    async fn test_health_and_network_error() {
        let backend = FakeBackend::spawn().await;
        let health = client(&backend).health().await.unwrap();
        assert_eq!(health.status, "ok");

        let base = backend.base.clone();
        drop(backend);
        tokio::time::sleep(Duration::from_millis(20)).await;
        let transport = HttpTransport::new(base, Duration::from_secs(2)).unwrap();
        let err = ApiClient::new(Arc::new(transport))
            .list_candidates()
            .await
            .unwrap_err();
        assert!(
            matches!(err, crate::errors::ClientError::Network(_)),
            "{err:?}"
        );
    }
}
