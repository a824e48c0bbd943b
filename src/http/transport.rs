use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use reqwest::header::{CONTENT_TYPE, HeaderValue};

use super::request::HttpRequest;
use super::response::HttpResponse;

/// Sends a single request. Any `Err` is treated as a transport failure and
/// may be retried; a response of any status is `Ok`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse>;
}

/// [`Transport`] backed by a reqwest [`Client`].
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Creates a transport with the crate's user agent.
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("reqclient/", env!("REQCLIENT_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self::with_client(client))
    }

    /// Wraps an existing reqwest Client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    pub fn inner(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    #[tracing::instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let mut builder = self
            .client
            .request(request.method.into(), request.url.clone())
            .timeout(request.timeout);

        if let Some(body) = &request.json_body {
            builder = builder
                .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
                .json(body);
        }

        let response = builder.send().await.context("Failed to send request")?;
        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read response body")?;

        debug!("{} {} -> {}", request.method, request.url, status);

        Ok(HttpResponse::new(status, body))
    }
}
