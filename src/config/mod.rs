//! Named client configurations.
//!
//! A [`ClientConfig`] describes where requests go (scheme, server, port,
//! path prefix), how long a single send may take, and how much of each
//! exchange is logged. Configurations are changed through
//! [`ClientConfig::configure`] with a set of [`ClientOptions`] and are kept
//! by name in a [`ClientRegistry`].

mod level;
mod registry;

use serde::{Deserialize, Deserializer};
use std::time::Duration;

pub use level::DebugLevel;
pub use registry::ClientRegistry;

/// Timeout applied to a freshly created configuration.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Port used for http when none has been configured.
pub const DEFAULT_HTTP_PORT: &str = "80";

/// Port used for https when none has been configured.
pub const DEFAULT_HTTPS_PORT: &str = "443";

/// Errors raised when a configuration ends up in an unusable state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// Configuration names must not be empty
    EmptyName,
    /// No server (host) has been set
    MissingServer,
    /// Port is not an integer in the valid port range
    InvalidPort(String),
    /// Path prefix is neither empty nor starting with "/"
    InvalidDomain(String),
}

impl std::fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigurationError::EmptyName => {
                write!(f, "Configuration name must not be empty")
            }
            ConfigurationError::MissingServer => {
                write!(f, "No server configured")
            }
            ConfigurationError::InvalidPort(port) => {
                write!(f, "Invalid port '{}': expected an integer between 0 and 65535", port)
            }
            ConfigurationError::InvalidDomain(domain) => {
                write!(f, "Invalid domain '{}': must be empty or start with '/'", domain)
            }
        }
    }
}

impl std::error::Error for ConfigurationError {}

/// Partial update for a [`ClientConfig`]. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientOptions {
    pub https: Option<bool>,
    pub server: Option<String>,
    pub port: Option<String>,
    pub domain: Option<String>,
    #[serde(rename = "timeout_ms", deserialize_with = "deserialize_timeout_ms")]
    pub timeout: Option<Duration>,
    pub debug_level: Option<DebugLevel>,
    pub use_by_default: Option<bool>,
}

impl ClientOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn https(mut self, https: bool) -> Self {
        self.https = Some(https);
        self
    }

    pub fn server(mut self, server: impl Into<String>) -> Self {
        self.server = Some(server.into());
        self
    }

    pub fn port(mut self, port: impl Into<String>) -> Self {
        self.port = Some(port.into());
        self
    }

    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn debug_level(mut self, level: DebugLevel) -> Self {
        self.debug_level = Some(level);
        self
    }

    pub fn use_by_default(mut self, use_by_default: bool) -> Self {
        self.use_by_default = Some(use_by_default);
        self
    }
}

fn deserialize_timeout_ms<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
}

/// A named, validated client configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    name: String,
    https: bool,
    server: String,
    port: Option<String>,
    domain: String,
    timeout: Duration,
    debug_level: DebugLevel,
    use_by_default: bool,
}

impl ClientConfig {
    /// Creates an unconfigured entry. It has no server yet, so it is not
    /// usable until [`configure`](Self::configure) succeeds on it.
    pub fn new(name: impl Into<String>) -> Result<Self, ConfigurationError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ConfigurationError::EmptyName);
        }

        Ok(Self {
            name,
            https: false,
            server: String::new(),
            port: None,
            domain: String::new(),
            timeout: DEFAULT_TIMEOUT,
            debug_level: DebugLevel::None,
            use_by_default: false,
        })
    }

    /// Applies `options` and validates the result.
    ///
    /// On error the configuration keeps the values it had before the call.
    pub fn configure(&mut self, options: ClientOptions) -> Result<(), ConfigurationError> {
        let mut candidate = self.clone();
        candidate.apply(options);
        candidate.validate()?;
        *self = candidate;
        Ok(())
    }

    fn apply(&mut self, options: ClientOptions) {
        if let Some(https) = options.https {
            self.https = https;
        }
        if let Some(server) = options.server {
            self.server = server;
        }
        if let Some(port) = options.port {
            self.port = Some(port);
        }
        if let Some(domain) = options.domain {
            self.domain = domain;
        }
        if let Some(timeout) = options.timeout {
            self.timeout = timeout;
        }
        if let Some(level) = options.debug_level {
            self.debug_level = level;
        }
        if let Some(use_by_default) = options.use_by_default {
            self.use_by_default = use_by_default;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.server.is_empty() {
            return Err(ConfigurationError::MissingServer);
        }
        let port = self.port();
        let digits_only = !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit());
        if !digits_only || port.parse::<u16>().is_err() {
            return Err(ConfigurationError::InvalidPort(port.to_string()));
        }
        if !self.domain.is_empty() && !self.domain.starts_with('/') {
            return Err(ConfigurationError::InvalidDomain(self.domain.clone()));
        }
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_https(&self) -> bool {
        self.https
    }

    pub fn scheme(&self) -> &'static str {
        if self.https { "https" } else { "http" }
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    /// The configured port, or the scheme's default when none was set.
    pub fn port(&self) -> &str {
        match &self.port {
            Some(port) => port,
            None if self.https => DEFAULT_HTTPS_PORT,
            None => DEFAULT_HTTP_PORT,
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn debug_level(&self) -> DebugLevel {
        self.debug_level
    }

    pub fn is_default(&self) -> bool {
        self.use_by_default
    }

    pub(crate) fn set_default(&mut self, use_by_default: bool) {
        self.use_by_default = use_by_default;
    }

    /// `{scheme}://{server}:{port}{domain}`, without any normalization.
    pub fn base_url(&self) -> String {
        format!(
            "{}://{}:{}{}",
            self.scheme(),
            self.server,
            self.port(),
            self.domain
        )
    }
}
