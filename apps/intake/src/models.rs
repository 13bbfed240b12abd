use std::collections::{BTreeMap, HashSet};
use std::fmt;

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::field::{empty_as_none, FieldModel};

/// Server-assigned candidate identifier. Opaque to the client beyond display and path building.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CandidateId(pub i64);

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExtractionStatus {
    Pending,
    Parsing,
    Parsed,
    Failed,
    #[default]
    #[serde(other)]
    Unknown,
}

impl ExtractionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionStatus::Pending => "PENDING",
            ExtractionStatus::Parsing => "PARSING",
            ExtractionStatus::Parsed => "PARSED",
            ExtractionStatus::Failed => "FAILED",
            ExtractionStatus::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for ExtractionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// One dashboard row. `email` and `phone` arrive already masked.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CandidateSummary {
    pub id: CandidateId,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub latest_company: Option<String>,
    #[serde(default)]
    pub extraction_status: ExtractionStatus,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// The list endpoint answers either paginated (`{ results: [...] }`) or with a bare array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum CandidateList {
    Paged { results: Vec<CandidateSummary> },
    Bare(Vec<CandidateSummary>),
}

impl CandidateList {
    pub fn into_rows(self) -> Vec<CandidateSummary> {
        match self {
            CandidateList::Paged { results } => results,
            CandidateList::Bare(rows) => rows,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    pub name: String,
    #[serde(default)]
    pub confidence: f64,
}

/// The five extracted attributes a profile always carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileField {
    Name,
    Email,
    Phone,
    Company,
    Designation,
}

impl ProfileField {
    pub const ALL: [ProfileField; 5] = [
        ProfileField::Name,
        ProfileField::Email,
        ProfileField::Phone,
        ProfileField::Company,
        ProfileField::Designation,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ProfileField::Name => "Name",
            ProfileField::Email => "Email",
            ProfileField::Phone => "Phone",
            ProfileField::Company => "Company",
            ProfileField::Designation => "Designation",
        }
    }

    /// Only PII fields carry a masked form worth showing.
    pub fn is_pii(&self) -> bool {
        matches!(self, ProfileField::Email | ProfileField::Phone)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub name: FieldModel,
    #[serde(default)]
    pub email: FieldModel,
    #[serde(default)]
    pub phone: FieldModel,
    #[serde(default)]
    pub company: FieldModel,
    #[serde(default)]
    pub designation: FieldModel,
    #[serde(default, deserialize_with = "unique_skills")]
    pub skills: Vec<Skill>,
    #[serde(default)]
    pub model_name: Option<String>,
    #[serde(default)]
    pub extracted_at: Option<String>,
}

impl Profile {
    pub fn field(&self, which: ProfileField) -> &FieldModel {
        match which {
            ProfileField::Name => &self.name,
            ProfileField::Email => &self.email,
            ProfileField::Phone => &self.phone,
            ProfileField::Company => &self.company,
            ProfileField::Designation => &self.designation,
        }
    }
}

/// Skill names are unique within a profile; the first occurrence wins.
fn unique_skills<'de, D>(deserializer: D) -> Result<Vec<Skill>, D::Error>
where
    D: Deserializer<'de>,
{
    let skills = Option::<Vec<Skill>>::deserialize(deserializer)?.unwrap_or_default();
    let mut seen = HashSet::new();
    Ok(skills
        .into_iter()
        .filter(|s| seen.insert(s.name.clone()))
        .collect())
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub struct DocumentStatus {
    #[serde(default)]
    pub present: bool,
    #[serde(default)]
    pub verified: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CandidateDetail {
    pub id: CandidateId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub profile: Profile,
    #[serde(default)]
    pub extraction_status: Option<ExtractionStatus>,
    #[serde(default)]
    pub documents: BTreeMap<String, DocumentStatus>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "UPPERCASE")]
pub enum Channel {
    #[default]
    Email,
    Sms,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Channel::Email => "EMAIL",
            Channel::Sms => "SMS",
        })
    }
}

#[derive(Debug, Serialize)]
pub struct RequestDocumentsBody {
    pub channel: Channel,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DocumentRequestReceipt {
    #[serde(default)]
    pub request_id: Option<i64>,
    pub channel: String,
    #[serde(default)]
    pub status: Option<String>,
    pub link: String,
    #[serde(default)]
    pub message_preview: Option<String>,
}

/// Raw JSON object an upload resolves with; empty when the body was not decodable.
pub type UploadResult = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ResumeUploaded {
    pub candidate_id: CandidateId,
    #[serde(default)]
    pub resume_id: Option<i64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ResumeUploaded {
    pub fn from_result(result: &UploadResult) -> Option<Self> {
        serde_json::from_value(Value::Object(result.clone())).ok()
    }
}

/// Outcome of one document submission. Shown once, never retained.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSubmission {
    pub submission_id: Option<i64>,
    pub accepted: bool,
    pub pan_document_id: Option<i64>,
    pub aadhaar_document_id: Option<i64>,
}

impl DocumentSubmission {
    pub fn from_result(result: &UploadResult) -> Self {
        let int = |key: &str| result.get(key).and_then(Value::as_i64);
        let submission_id = int("submission_id");
        Self {
            submission_id,
            accepted: submission_id.is_some(),
            pan_document_id: int("pan_document_id"),
            aadhaar_document_id: int("aadhaar_document_id"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

/// Formats a server timestamp as `YYYY-MM-DD HH:MM`; unparsable input is shown unchanged.
pub fn display_timestamp(raw: &str) -> String {
    const FORMAT: &str = "%Y-%m-%d %H:%M";
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return ts.format(FORMAT).to_string();
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return ts.format(FORMAT).to_string();
    }
    raw.to_string()
}
