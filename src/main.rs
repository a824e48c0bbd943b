use anyhow::{Context, Result};
use clap::Parser;
use reqclient::http::DEFAULT_MAX_ATTEMPTS;
use reqclient::{ClientOptions, ClientRegistry, DebugLevel, Method, RequestClient};
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration name used when neither --name nor a default is available.
const FALLBACK_NAME: &str = "default";

/// reqclient - send JSON requests through a named client configuration
///
/// Connection settings come from a configuration file (--config) and/or the
/// flags below; flags win over file values for the selected configuration.
///
/// Examples:
///   reqclient --server api.example.com --port 8080 get /users --data '{"id":1}'
///   reqclient --config clients.json --name billing post /invoices -d '{"amount":10}'
#[derive(Parser, Debug)]
#[command(author, version = env!("REQCLIENT_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON file mapping configuration names to options (also via REQCLIENT_CONFIG)
    #[arg(
        long,
        short = 'c',
        env = "REQCLIENT_CONFIG",
        value_name = "PATH",
        global = true
    )]
    config: Option<PathBuf>,

    /// Configuration to use (defaults to the one marked use_by_default)
    #[arg(long, short = 'n', value_name = "NAME", global = true)]
    name: Option<String>,

    /// Use https instead of http
    #[arg(long, global = true, overrides_with = "no_https")]
    https: bool,

    /// Use http even when the configuration file turns https on
    #[arg(long = "no-https", global = true, overrides_with = "https")]
    no_https: bool,

    /// Server host name
    #[arg(long, env = "REQCLIENT_SERVER", value_name = "HOST", global = true)]
    server: Option<String>,

    /// Server port
    #[arg(long, env = "REQCLIENT_PORT", value_name = "PORT", global = true)]
    port: Option<String>,

    /// Path prefix placed before every service, e.g. /v1
    #[arg(long, value_name = "PATH", global = true)]
    domain: Option<String>,

    /// Per-attempt timeout in milliseconds
    #[arg(long = "timeout-ms", value_name = "MS", global = true)]
    timeout_ms: Option<u64>,

    /// none, request-min, request-max, answer-min, answer-max, min or max
    #[arg(long = "debug-level", value_name = "LEVEL", global = true)]
    debug_level: Option<DebugLevel>,
}

impl Cli {
    /// Options given on the command line. Unset flags leave file values alone.
    fn options(&self) -> ClientOptions {
        ClientOptions {
            https: self.https_override(),
            server: self.server.clone(),
            port: self.port.clone(),
            domain: self.domain.clone(),
            timeout: self.timeout_ms.map(Duration::from_millis),
            debug_level: self.debug_level,
            use_by_default: None,
        }
    }

    fn https_override(&self) -> Option<bool> {
        match (self.https, self.no_https) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Send a GET request (body fields become query parameters)
    Get(RequestArgs),

    /// Send a POST request with a JSON body
    Post(RequestArgs),

    /// Send a PUT request with a JSON body
    Put(RequestArgs),

    /// Send a DELETE request (body fields become query parameters)
    Delete(RequestArgs),
}

impl Commands {
    fn request(&self) -> (Method, &RequestArgs) {
        match self {
            Commands::Get(args) => (Method::Get, args),
            Commands::Post(args) => (Method::Post, args),
            Commands::Put(args) => (Method::Put, args),
            Commands::Delete(args) => (Method::Delete, args),
        }
    }
}

#[derive(clap::Args, Debug)]
pub struct RequestArgs {
    /// Service path appended to the domain, e.g. /users
    #[arg(value_name = "SERVICE")]
    pub service: String,

    /// Request body as JSON
    #[arg(long, short = 'd', value_name = "JSON")]
    pub data: Option<String>,

    /// Total attempts when the server cannot be reached
    #[arg(long, short = 'a', value_name = "N", default_value_t = DEFAULT_MAX_ATTEMPTS)]
    pub attempts: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    run(cli).await
}

async fn run(cli: Cli) -> Result<()> {
    let mut registry = ClientRegistry::new();
    if let Some(path) = &cli.config {
        registry.load_file(path)?;
    }

    let name = cli
        .name
        .clone()
        .or_else(|| registry.default_name().map(str::to_string))
        .unwrap_or_else(|| FALLBACK_NAME.to_string());

    let config = registry
        .configure(&name, cli.options())
        .with_context(|| format!("Invalid configuration '{}'", name))?
        .clone();

    let (method, args) = cli.command.request();
    let body = args
        .data
        .as_deref()
        .map(|data| serde_json::from_str::<Value>(data))
        .transpose()
        .context("--data is not valid JSON")?;

    let client = RequestClient::new(config)?;
    let response = client
        .execute(method, &args.service, body.as_ref(), args.attempts)
        .await
        .into_result()?;

    println!("{}", response.to_pretty_string());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_get_parsing() {
        let cli = Cli::try_parse_from([
            "reqclient",
            "--server",
            "api.example.com",
            "get",
            "/users",
            "--data",
            r#"{"id":1}"#,
        ])
        .unwrap();

        let (method, args) = cli.command.request();
        assert_eq!(method, Method::Get);
        assert_eq!(args.service, "/users");
        assert_eq!(args.data.as_deref(), Some(r#"{"id":1}"#));
        assert_eq!(args.attempts, DEFAULT_MAX_ATTEMPTS);
        assert_eq!(cli.server.as_deref(), Some("api.example.com"));
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "reqclient",
            "post",
            "/users",
            "--port",
            "8080",
            "--https",
            "--attempts",
            "3",
        ])
        .unwrap();

        let (method, args) = cli.command.request();
        assert_eq!(method, Method::Post);
        assert_eq!(args.attempts, 3);
        assert_eq!(cli.port.as_deref(), Some("8080"));
        assert!(cli.https);
    }

    #[test]
    fn test_cli_options_leave_unset_flags_empty() {
        let cli = Cli::try_parse_from(["reqclient", "delete", "/users/1"]).unwrap();
        let options = cli.options();
        assert_eq!(options.https, None);
        assert_eq!(options.domain, None);
        assert_eq!(options.timeout, None);
        assert_eq!(options.use_by_default, None);
    }

    #[test]
    fn test_cli_options_from_flags() {
        let cli = Cli::try_parse_from([
            "reqclient",
            "--domain",
            "/v1",
            "--timeout-ms",
            "250",
            "--debug-level",
            "answer-max",
            "put",
            "/users/1",
        ])
        .unwrap();

        let options = cli.options();
        assert_eq!(options.domain.as_deref(), Some("/v1"));
        assert_eq!(options.timeout, Some(Duration::from_millis(250)));
        assert_eq!(options.debug_level, Some(DebugLevel::AnswerMax));
    }

    #[test]
    fn test_cli_https_can_be_turned_off() {
        let cli = Cli::try_parse_from(["reqclient", "--no-https", "get", "/"]).unwrap();
        assert_eq!(cli.options().https, Some(false));

        let cli = Cli::try_parse_from(["reqclient", "--https", "get", "/"]).unwrap();
        assert_eq!(cli.options().https, Some(true));
    }

    #[test]
    fn test_cli_last_https_flag_wins() {
        let cli =
            Cli::try_parse_from(["reqclient", "--https", "get", "/", "--no-https"]).unwrap();
        assert_eq!(cli.options().https, Some(false));

        let cli =
            Cli::try_parse_from(["reqclient", "--no-https", "get", "/", "--https"]).unwrap();
        assert_eq!(cli.options().https, Some(true));
    }

    #[test]
    fn test_cli_rejects_unknown_debug_level() {
        let result = Cli::try_parse_from(["reqclient", "--debug-level", "loud", "get", "/"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_no_subcommand_fails() {
        let result = Cli::try_parse_from(["reqclient", "/users"]);
        assert!(result.is_err());
    }
}
