//! Request client bound to one configuration.

use anyhow::Result;
use log::{info, warn};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use super::request::{HttpRequest, Method, RequestAttempt};
use super::response::{HttpResponse, ResponseBody};
use super::retry::{RETRY_DELAY, TransportFailure, with_retry};
use super::transport::{ReqwestTransport, Transport};
use crate::config::{ClientConfig, DebugLevel};

/// Called with the final response (or `None` when there was none) whenever
/// a request does not end in a 200.
pub type ErrorHook = Arc<dyn Fn(Option<&HttpResponse>) + Send + Sync>;

/// Why a request produced no decoded body.
#[derive(Debug)]
pub enum Failure {
    /// The request could not be built (bad URL, unsupported query body)
    InvalidRequest(anyhow::Error),
    /// No response was obtained within the allowed attempts
    Exhausted(TransportFailure),
    /// The server answered with something other than 200
    Status(HttpResponse),
}

impl Failure {
    /// The response handed to the error hook.
    pub fn response(&self) -> Option<&HttpResponse> {
        match self {
            Failure::Status(response) => Some(response),
            Failure::InvalidRequest(_) | Failure::Exhausted(_) => None,
        }
    }
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Failure::InvalidRequest(e) => write!(f, "Invalid request: {:#}", e),
            Failure::Exhausted(e) => write!(f, "{}", e),
            Failure::Status(response) => {
                write!(
                    f,
                    "Server answered {} {}",
                    response.status.as_u16(),
                    response.reason
                )?;
                if !response.body.is_empty() {
                    write!(f, ": {}", response.body)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for Failure {}

/// Result of [`RequestClient::execute`].
#[derive(Debug)]
pub enum RequestOutcome {
    Success(ResponseBody),
    Failed(Failure),
}

impl RequestOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RequestOutcome::Success(_))
    }

    pub fn ok(self) -> Option<ResponseBody> {
        match self {
            RequestOutcome::Success(body) => Some(body),
            RequestOutcome::Failed(_) => None,
        }
    }

    pub fn into_result(self) -> Result<ResponseBody, Failure> {
        match self {
            RequestOutcome::Success(body) => Ok(body),
            RequestOutcome::Failed(failure) => Err(failure),
        }
    }
}

/// Sends JSON requests for one [`ClientConfig`].
///
/// The configuration is a snapshot taken when the client is built; cloning
/// the client is cheap and clones share the transport and error hook.
#[derive(Clone)]
pub struct RequestClient {
    config: Arc<ClientConfig>,
    transport: Arc<dyn Transport>,
    error_hook: Option<ErrorHook>,
    retry_delay: Duration,
}

impl RequestClient {
    /// Creates a client that sends through reqwest.
    pub fn new(config: ClientConfig) -> Result<Self> {
        Ok(Self::with_transport(config, ReqwestTransport::new()?))
    }

    pub fn with_transport<T: Transport + 'static>(config: ClientConfig, transport: T) -> Self {
        Self {
            config: Arc::new(config),
            transport: Arc::new(transport),
            error_hook: None,
            retry_delay: RETRY_DELAY,
        }
    }

    /// Registers the error hook, replacing any previous one.
    pub fn on_error<F>(mut self, hook: F) -> Self
    where
        F: Fn(Option<&HttpResponse>) + Send + Sync + 'static,
    {
        self.set_error_hook(hook);
        self
    }

    pub fn set_error_hook<F>(&mut self, hook: F)
    where
        F: Fn(Option<&HttpResponse>) + Send + Sync + 'static,
    {
        self.error_hook = Some(Arc::new(hook));
    }

    pub fn clear_error_hook(&mut self) {
        self.error_hook = None;
    }

    /// Overrides the pause between attempts (2 seconds by default).
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub async fn get(
        &self,
        service: &str,
        body: Option<&Value>,
        max_attempts: usize,
    ) -> Option<ResponseBody> {
        self.request(Method::Get, service, body, max_attempts).await
    }

    pub async fn post(
        &self,
        service: &str,
        body: Option<&Value>,
        max_attempts: usize,
    ) -> Option<ResponseBody> {
        self.request(Method::Post, service, body, max_attempts).await
    }

    pub async fn put(
        &self,
        service: &str,
        body: Option<&Value>,
        max_attempts: usize,
    ) -> Option<ResponseBody> {
        self.request(Method::Put, service, body, max_attempts).await
    }

    pub async fn delete(
        &self,
        service: &str,
        body: Option<&Value>,
        max_attempts: usize,
    ) -> Option<ResponseBody> {
        self.request(Method::Delete, service, body, max_attempts).await
    }

    /// Sends a request and returns the decoded body of a 200 response.
    ///
    /// Any other outcome calls the error hook and returns `None`.
    pub async fn request(
        &self,
        method: Method,
        service: &str,
        body: Option<&Value>,
        max_attempts: usize,
    ) -> Option<ResponseBody> {
        match self.execute(method, service, body, max_attempts).await {
            RequestOutcome::Success(body) => Some(body),
            RequestOutcome::Failed(failure) => {
                if let Some(hook) = &self.error_hook {
                    hook(failure.response());
                }
                None
            }
        }
    }

    /// Sends a request, retrying transport failures up to `max_attempts`
    /// times in total. Does not call the error hook.
    #[tracing::instrument(skip(self, body), fields(config = %self.config.name()))]
    pub async fn execute(
        &self,
        method: Method,
        service: &str,
        body: Option<&Value>,
        max_attempts: usize,
    ) -> RequestOutcome {
        let request = match HttpRequest::build(&self.config, method, service, body) {
            Ok(request) => request,
            Err(e) => {
                warn!("{} {}: {:#}", method, service, e);
                return RequestOutcome::Failed(Failure::InvalidRequest(e));
            }
        };

        let level = self.config.debug_level();
        let operation_name = format!("{} {}", method, request.url);

        let sent = with_retry(&operation_name, max_attempts, self.retry_delay, |number| {
            let request = &request;
            async move {
                let attempt = RequestAttempt::start(request, body, number);
                log_request(level, &attempt);
                let response = self.transport.send(request).await?;
                Ok::<_, anyhow::Error>((attempt, response))
            }
        })
        .await;

        let (attempt, response) = match sent {
            Ok(sent) => sent,
            Err(failure) => return RequestOutcome::Failed(Failure::Exhausted(failure)),
        };

        log_answer(level, &attempt, &response);

        if !response.is_ok() {
            return RequestOutcome::Failed(Failure::Status(response));
        }

        RequestOutcome::Success(ResponseBody::decode(response.body))
    }
}

fn log_request(level: DebugLevel, attempt: &RequestAttempt) {
    for line in request_log_lines(level, attempt) {
        info!("{}", line);
    }
}

fn log_answer(level: DebugLevel, attempt: &RequestAttempt, response: &HttpResponse) {
    for line in answer_log_lines(level, attempt, response) {
        info!("{}", line);
    }
}

/// Lines logged when an attempt is sent, empty when `level` is quiet.
fn request_log_lines(level: DebugLevel, attempt: &RequestAttempt) -> Vec<String> {
    let mut lines = Vec::new();
    if level.logs_request() {
        lines.push(format!(
            "{} {} (attempt {}) sent at {}",
            attempt.method,
            attempt.url,
            attempt.number,
            attempt.sent_at.to_rfc3339()
        ));
    }
    if level.logs_request_body()
        && let Some(body) = &attempt.body
    {
        lines.push(format!(
            "{} {} request body: {}",
            attempt.method, attempt.url, body
        ));
    }
    lines
}

/// Lines logged when an answer arrives.
fn answer_log_lines(
    level: DebugLevel,
    attempt: &RequestAttempt,
    response: &HttpResponse,
) -> Vec<String> {
    let mut lines = Vec::new();
    if level.logs_answer() {
        lines.push(format!(
            "{} {} answered in {}ms: {} {}",
            attempt.method,
            attempt.url,
            attempt.elapsed().as_millis(),
            response.status.as_u16(),
            response.reason
        ));
    }
    if level.logs_answer_body() {
        lines.push(format!(
            "{} {} answer body: {}",
            attempt.method, attempt.url, response.body
        ));
    }
    lines
}
