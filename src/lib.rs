//! Configurable JSON-over-HTTP client.
//!
//! Build a [`ClientConfig`] (directly or through a [`ClientRegistry`]),
//! hand it to a [`RequestClient`], and call one of the verbs:
//!
//! ```no_run
//! use reqclient::{ClientConfig, ClientOptions, RequestClient};
//! use serde_json::json;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let mut config = ClientConfig::new("api")?;
//! config.configure(
//!     ClientOptions::new()
//!         .https(true)
//!         .server("api.example.com")
//!         .port("8080")
//!         .domain("/v1"),
//! )?;
//!
//! let client = RequestClient::new(config)?
//!     .on_error(|response| eprintln!("request failed: {:?}", response.map(|r| r.status)));
//!
//! // GET https://api.example.com:8080/v1/users?id=1, up to 3 attempts
//! let user = client.get("/users", Some(&json!({"id": 1})), 3).await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod http;

pub use config::{ClientConfig, ClientOptions, ClientRegistry, ConfigurationError, DebugLevel};
pub use http::{
    Failure, HttpResponse, Method, RequestClient, RequestOutcome, ResponseBody, Transport,
};
