use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use reqwest::Url;
use serde_json::Value;
use std::fmt;
use std::time::{Duration, Instant};

use crate::config::ClientConfig;

/// The verbs a [`RequestClient`](super::RequestClient) can send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }

    /// POST and PUT carry the body as JSON; GET and DELETE put it in the
    /// query string.
    pub fn sends_json_body(self) -> bool {
        matches!(self, Method::Post | Method::Put)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// A fully resolved request, as handed to a [`Transport`](super::Transport).
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub json_body: Option<Value>,
    pub timeout: Duration,
}

impl HttpRequest {
    /// Resolves `service` against `config` and places `body` according to
    /// the verb. POST and PUT always carry a JSON payload, `null` when no
    /// body was given.
    pub fn build(
        config: &ClientConfig,
        method: Method,
        service: &str,
        body: Option<&Value>,
    ) -> Result<Self> {
        let url = build_url(config, method, service, body)?;
        let json_body = if method.sends_json_body() {
            Some(body.cloned().unwrap_or(Value::Null))
        } else {
            None
        };

        Ok(Self {
            method,
            url,
            json_body,
            timeout: config.timeout(),
        })
    }
}

/// Builds `{scheme}://{server}[:{port}]{domain}{service}`.
///
/// The port is dropped when it is the scheme's default. For GET and DELETE
/// the fields of an object `body` are appended as query parameters.
pub fn build_url(
    config: &ClientConfig,
    method: Method,
    service: &str,
    body: Option<&Value>,
) -> Result<Url> {
    let raw = format!("{}{}", config.base_url(), service);
    let mut url = Url::parse(&raw).with_context(|| format!("Invalid request URL '{}'", raw))?;

    if method.sends_json_body() {
        return Ok(url);
    }

    match body {
        Some(Value::Object(fields)) if !fields.is_empty() => {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in fields {
                pairs.append_pair(key, &query_value(value));
            }
        }
        Some(Value::Object(_)) | Some(Value::Null) | None => {}
        Some(other) => {
            anyhow::bail!(
                "{} body must be a JSON object to be sent as query parameters, got: {}",
                method,
                other
            );
        }
    }

    Ok(url)
}

fn query_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// One send of a request, kept for logging and retry bookkeeping.
///
/// `body` is the caller's body whatever the verb, so GET and DELETE
/// parameters show up in body logs too.
#[derive(Debug, Clone)]
pub struct RequestAttempt {
    pub method: Method,
    pub url: Url,
    pub body: Option<Value>,
    pub number: usize,
    pub sent_at: DateTime<Utc>,
    started: Instant,
}

impl RequestAttempt {
    pub fn start(request: &HttpRequest, body: Option<&Value>, number: usize) -> Self {
        Self {
            method: request.method,
            url: request.url.clone(),
            body: body.cloned(),
            number,
            sent_at: Utc::now(),
            started: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}
