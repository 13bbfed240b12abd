use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Method;
use serde_json::Value;

use super::{FormField, MultipartPayload, ProgressFn, Transport};
use crate::errors::ClientError;

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: Method,
    pub path: String,
    pub json: Option<Value>,
    pub fields: Vec<FormField>,
}

impl RecordedCall {
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(FormField::name).collect()
    }

    pub fn text_field(&self, name: &str) -> Option<&str> {
        self.fields.iter().find_map(|f| match f {
            FormField::Text { name: n, value } if n == name => Some(value.as_str()),
            _ => None,
        })
    }
}

type Responder = Box<dyn Fn(&RecordedCall) -> Result<Bytes, ClientError> + Send + Sync>;

/// In-memory transport that records every exchange and answers from a closure.
pub struct RecordingTransport {
    calls: Mutex<Vec<RecordedCall>>,
    responder: Responder,
    progress_steps: Vec<u8>,
}

impl RecordingTransport {
    pub fn new(
        responder: impl Fn(&RecordedCall) -> Result<Bytes, ClientError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            responder: Box::new(responder),
            progress_steps: vec![25, 50, 75, 100],
        }
    }

    /// Always answers with the given JSON body.
    pub fn json(body: Value) -> Self {
        let bytes = Bytes::from(body.to_string());
        Self::new(move |_| Ok(bytes.clone()))
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn record(&self, call: RecordedCall) -> Result<Bytes, ClientError> {
        let result = (self.responder)(&call);
        self.calls.lock().unwrap().push(call);
        result
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, ClientError> {
        let bytes = self.record(RecordedCall {
            method,
            path: path.to_string(),
            json: body.cloned(),
            fields: Vec::new(),
        })?;
        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn upload(
        &self,
        path: &str,
        payload: MultipartPayload,
        progress: Option<ProgressFn>,
    ) -> Result<Bytes, ClientError> {
        if let Some(progress) = &progress {
            if payload.file_bytes() > 0 {
                for step in &self.progress_steps {
                    progress(*step);
                }
            }
        }
        self.record(RecordedCall {
            method: Method::POST,
            path: path.to_string(),
            json: None,
            fields: payload.into_fields(),
        })
    }
}
