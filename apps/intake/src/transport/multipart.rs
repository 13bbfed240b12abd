use std::path::{Path, PathBuf};

use bytes::Bytes;

use crate::errors::ClientError;

/// A binary file ready to be sent as one multipart part.
#[derive(Debug, Clone)]
pub struct FilePart {
    pub file_name: String,
    pub mime: String,
    pub bytes: Bytes,
}

impl FilePart {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        let file_name = file_name.into();
        let mime = guess_mime(&file_name).to_string();
        Self {
            file_name,
            mime,
            bytes: bytes.into(),
        }
    }

    /// Reads a file from disk. An unreadable file is a client-side failure, not a network one.
    pub async fn from_path(path: &Path) -> Result<Self, ClientError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ClientError::Validation(format!("Cannot read {}: {e}", path.display())))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.bin".to_string());
        Ok(Self::new(file_name, bytes))
    }

    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Where a file part comes from. Paths are only read when `load` runs, so a missing file
/// fails the action that sends it rather than whoever built the request.
#[derive(Debug, Clone)]
pub enum FileSource {
    Path(PathBuf),
    Loaded(FilePart),
}

impl FileSource {
    pub fn display_name(&self) -> String {
        match self {
            FileSource::Path(path) => path.display().to_string(),
            FileSource::Loaded(file) => file.file_name.clone(),
        }
    }

    pub async fn load(self) -> Result<FilePart, ClientError> {
        match self {
            FileSource::Path(path) => FilePart::from_path(&path).await,
            FileSource::Loaded(file) => Ok(file),
        }
    }
}

impl From<PathBuf> for FileSource {
    fn from(path: PathBuf) -> Self {
        FileSource::Path(path)
    }
}

impl From<FilePart> for FileSource {
    fn from(file: FilePart) -> Self {
        FileSource::Loaded(file)
    }
}

fn guess_mime(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "pdf" => "application/pdf",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        _ => "application/octet-stream",
    }
}

#[derive(Debug, Clone)]
pub enum FormField {
    Text { name: String, value: String },
    File { name: String, file: FilePart },
}

impl FormField {
    pub fn name(&self) -> &str {
        match self {
            FormField::Text { name, .. } | FormField::File { name, .. } => name,
        }
    }
}

/// Ordered multipart body. The boundary and content-type header are left to the HTTP client.
#[derive(Debug, Clone, Default)]
pub struct MultipartPayload {
    fields: Vec<FormField>,
}

impl MultipartPayload {
    pub fn push_text(&mut self, name: &str, value: String) {
        self.fields.push(FormField::Text {
            name: name.to_string(),
            value,
        });
    }

    pub fn push_file(&mut self, name: &str, file: FilePart) {
        self.fields.push(FormField::File {
            name: name.to_string(),
            file,
        });
    }

    pub fn into_fields(self) -> Vec<FormField> {
        self.fields
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(FormField::name).collect()
    }

    /// Total bytes across file parts; the denominator for progress.
    pub fn file_bytes(&self) -> u64 {
        self.fields
            .iter()
            .map(|f| match f {
                FormField::File { file, .. } => file.len(),
                FormField::Text { .. } => 0,
            })
            .sum()
    }
}
