use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::quiz::Envelope;

/// Incoming invocation event. `body` normally holds a JSON document encoded as
/// a string; an inline object is accepted too.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HandlerEvent {
    #[serde(default)]
    pub body: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestBody {
    #[serde(default, rename = "pdfUrl")]
    pub pdf_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandlerResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl HandlerResponse {
    pub fn from_envelope(status_code: u16, envelope: &Envelope) -> Self {
        let mut headers = HashMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        Self {
            status_code,
            headers,
            body: envelope.to_json(),
        }
    }

    pub fn ok(envelope: &Envelope) -> Self {
        Self::from_envelope(200, envelope)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::from_envelope(400, &Envelope::error(message))
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::from_envelope(500, &Envelope::error(message))
    }
}
