//! Confidence-scored, partially-redacted field values and their display form.

use serde::{Deserialize, Deserializer, Serialize};

/// Placeholder shown wherever a value or masked form is absent.
pub const PLACEHOLDER: &str = "-";

/// One extracted candidate attribute: `{ value, confidence, masked }`.
///
/// Read-only once received. A refetch produces a new `FieldModel`; nothing mutates one
/// in place, which is why there are no setters.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FieldModel {
    #[serde(default, deserialize_with = "empty_as_none")]
    value: Option<String>,
    #[serde(default, deserialize_with = "null_as_zero")]
    confidence: f64,
    #[serde(default, deserialize_with = "empty_as_none")]
    masked: Option<String>,
}

impl FieldModel {
    #[cfg(test)]
    pub fn new(value: Option<&str>, confidence: f64, masked: Option<&str>) -> Self {
        Self {
            value: value.map(str::to_string),
            confidence,
            masked: masked.map(str::to_string),
        }
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn masked(&self) -> Option<&str> {
        self.masked.as_deref()
    }
}

/// Display form of a `FieldModel`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedField {
    pub display_value: String,
    pub confidence_percent: u8,
    pub masked_line: String,
}

impl RenderedField {
    /// Badge text, e.g. `95%`.
    pub fn badge(&self) -> String {
        format!("{}%", self.confidence_percent)
    }
}

/// Total and deterministic: every input renders, nothing panics.
pub fn render(field: &FieldModel) -> RenderedField {
    RenderedField {
        display_value: field.value().unwrap_or(PLACEHOLDER).to_string(),
        confidence_percent: confidence_percent(field.confidence()),
        masked_line: field.masked().unwrap_or(PLACEHOLDER).to_string(),
    }
}

/// `round(confidence * 100)`, clamped to `[0, 100]`; non-finite input counts as 0.
pub fn confidence_percent(confidence: f64) -> u8 {
    if !confidence.is_finite() {
        return 0;
    }
    (confidence * 100.0).round().clamp(0.0, 100.0) as u8
}

/// The backend fills missing text with `""`; treat it the same as `null`.
pub(crate) fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|s| !s.trim().is_empty()))
}

fn null_as_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0))
}
