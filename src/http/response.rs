use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;

/// What the transport got back for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub reason: String,
    pub body: String,
}

impl HttpResponse {
    /// Builds a response with the canonical reason phrase for `status`.
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            reason: status.canonical_reason().unwrap_or_default().to_string(),
            body: body.into(),
        }
    }

    /// Only a plain 200 counts as success.
    pub fn is_ok(&self) -> bool {
        self.status == StatusCode::OK
    }
}

/// A decoded 200 response: JSON when the body parses, raw text otherwise.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(Value),
    Text(String),
}

impl ResponseBody {
    pub fn decode(body: String) -> Self {
        match serde_json::from_str::<Value>(&body) {
            Ok(value) => ResponseBody::Json(value),
            Err(_) => ResponseBody::Text(body),
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ResponseBody::Json(value) => Some(value),
            ResponseBody::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ResponseBody::Json(_) => None,
            ResponseBody::Text(text) => Some(text),
        }
    }

    /// Converts a JSON body into a typed value.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        match self {
            ResponseBody::Json(value) => T::deserialize(value)
                .context("Failed to deserialize JSON response"),
            ResponseBody::Text(_) => anyhow::bail!("Response body is not JSON"),
        }
    }

    /// JSON pretty-printed, text as-is.
    pub fn to_pretty_string(&self) -> String {
        match self {
            ResponseBody::Json(value) => {
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
            }
            ResponseBody::Text(text) => text.clone(),
        }
    }
}

impl fmt::Display for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseBody::Json(value) => write!(f, "{}", value),
            ResponseBody::Text(text) => f.write_str(text),
        }
    }
}
