use clap::builder::TypedValueParser as _;
use clap::Parser;
use dotenvy::dotenv;
use log::LevelFilter;
use secrecy::{ExposeSecret, SecretString};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default base URL of the provider REST API.
pub const DEFAULT_API_BASE_URL: &str = "https://api.agora.io";

/// Default user agent sent on REST calls.
pub const DEFAULT_USER_AGENT: &str = concat!("rtc-platform-rs/", env!("CARGO_PKG_VERSION"));

/// Cloud recording modes accepted by the provider.
pub const RECORDING_MODES: [&str; 3] = ["individual", "composite", "web"];

#[derive(Clone, Debug, PartialEq)]
pub enum RustEnv {
    Development,
    Production,
    Staging,
}

#[derive(Debug, PartialEq, Eq)]
pub struct RustEnvParseError;

impl fmt::Display for RustEnvParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "expected one of: development, production, staging")
    }
}

impl std::error::Error for RustEnvParseError {}

impl FromStr for RustEnv {
    type Err = RustEnvParseError;
    fn from_str(level: &str) -> Result<RustEnv, Self::Err> {
        match level.to_lowercase().as_str() {
            "development" => Ok(RustEnv::Development),
            "production" => Ok(RustEnv::Production),
            "staging" => Ok(RustEnv::Staging),
            _ => Err(RustEnvParseError),
        }
    }
}

impl fmt::Display for RustEnv {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RustEnv::Development => write!(f, "development"),
            RustEnv::Production => write!(f, "production"),
            RustEnv::Staging => write!(f, "staging"),
        }
    }
}

/// Secrets never show up in `Debug` output; `SecretString` redacts them.
fn parse_secret(value: &str) -> Result<SecretString, Infallible> {
    Ok(SecretString::new(value.to_string()))
}

fn non_empty_pair<'a>(
    id: Option<&'a str>,
    secret: Option<&'a SecretString>,
) -> Option<(&'a str, &'a SecretString)> {
    match (id, secret) {
        (Some(id), Some(secret)) if !id.is_empty() && !secret.expose_secret().is_empty() => {
            Some((id, secret))
        }
        _ => None,
    }
}

#[derive(Clone, Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// The application ID issued by the RTC provider. Becomes the token issuer.
    #[arg(long, env)]
    app_id: Option<String>,

    /// The app certificate used to sign channel access tokens.
    #[arg(long, env, value_parser = parse_secret)]
    app_certificate: Option<SecretString>,

    /// The customer ID used for Basic auth against the REST API.
    #[arg(long, env)]
    customer_id: Option<String>,

    /// The customer secret used for Basic auth and for webhook signatures.
    #[arg(long, env, value_parser = parse_secret)]
    customer_secret: Option<SecretString>,

    /// Bearer token for the REST API. Takes precedence over the customer ID and secret.
    #[arg(long, env, value_parser = parse_secret)]
    api_bearer_token: Option<SecretString>,

    /// The base URL of the provider REST API.
    /// Override in tests to point at a mock server.
    #[arg(long, env, default_value = DEFAULT_API_BASE_URL)]
    api_base_url: String,

    /// Default token lifetime in seconds (24 hours).
    #[arg(long, env, default_value_t = 86400)]
    pub token_expire_seconds: u32,

    /// Default privilege lifetime in seconds. 0 means the privilege never expires.
    #[arg(long, env, default_value_t = 0)]
    pub privilege_expire_seconds: u32,

    /// Verify HMAC signatures on inbound webhooks.
    #[arg(long, env, default_value_t = true, action = clap::ArgAction::Set)]
    pub verify_webhook_signature: bool,

    /// The uid the cloud recorder joins channels as.
    #[arg(long, env, default_value_t = 999999)]
    pub recording_uid: u32,

    /// Default cloud recording mode.
    #[arg(long, env, default_value = "composite",
        value_parser = clap::builder::PossibleValuesParser::new(RECORDING_MODES))]
    recording_mode: String,

    /// Timeout in seconds for REST API calls.
    #[arg(long, env, default_value_t = 30)]
    pub http_timeout_secs: u64,

    /// User agent sent on REST API calls.
    #[arg(long, env, default_value = DEFAULT_USER_AGENT)]
    http_user_agent: String,

    /// Channel to mint a token for.
    #[arg(long, env)]
    channel: Option<String>,

    /// User id to mint a token for. 0 grants access to any user.
    #[arg(long, env = "RTC_UID", default_value_t = 0)]
    pub uid: u32,

    /// Mint a publisher token instead of a subscriber token.
    #[arg(long, env)]
    pub publisher: bool,

    /// Set the log level verbosity threshold (level) to control what gets displayed on console output
    #[arg(
        short,
        long,
        env,
        default_value_t = LevelFilter::Info,
        value_parser = clap::builder::PossibleValuesParser::new(["OFF", "ERROR", "WARN", "INFO", "DEBUG", "TRACE"])
            .try_map(|s| s.parse::<LevelFilter>()),
        )]
    pub log_level_filter: LevelFilter,

    /// Set the Rust runtime environment to use.
    #[arg(
    short,
    long,
    env,
    default_value_t = RustEnv::Development,
    value_parser = clap::builder::PossibleValuesParser::new([
        "DEVELOPMENT", "PRODUCTION", "STAGING",
        "development", "production", "staging"
    ])
        .try_map(|s| s.parse::<RustEnv>()),
    )]
    pub runtime_env: RustEnv,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        // Load .env file first
        dotenv().ok();
        // Then parse the command line parameters and flags
        Config::parse()
    }

    pub fn app_id(&self) -> Option<&str> {
        self.app_id.as_deref()
    }

    pub fn set_app_id(mut self, app_id: String) -> Self {
        self.app_id = Some(app_id);
        self
    }

    pub fn app_certificate(&self) -> Option<&SecretString> {
        self.app_certificate.as_ref()
    }

    pub fn set_app_certificate(mut self, app_certificate: String) -> Self {
        self.app_certificate = Some(SecretString::new(app_certificate));
        self
    }

    pub fn customer_id(&self) -> Option<&str> {
        self.customer_id.as_deref()
    }

    pub fn set_customer_id(mut self, customer_id: String) -> Self {
        self.customer_id = Some(customer_id);
        self
    }

    pub fn customer_secret(&self) -> Option<&SecretString> {
        self.customer_secret.as_ref()
    }

    pub fn set_customer_secret(mut self, customer_secret: String) -> Self {
        self.customer_secret = Some(SecretString::new(customer_secret));
        self
    }

    pub fn api_bearer_token(&self) -> Option<&SecretString> {
        self.api_bearer_token
            .as_ref()
            .filter(|token| !token.expose_secret().is_empty())
    }

    pub fn set_api_bearer_token(mut self, api_bearer_token: String) -> Self {
        self.api_bearer_token = Some(SecretString::new(api_bearer_token));
        self
    }

    /// Returns the REST API base URL.
    pub fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    pub fn set_api_base_url(mut self, api_base_url: String) -> Self {
        self.api_base_url = api_base_url;
        self
    }

    /// Returns one of [`RECORDING_MODES`].
    pub fn recording_mode(&self) -> &str {
        &self.recording_mode
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn http_user_agent(&self) -> &str {
        &self.http_user_agent
    }

    pub fn channel(&self) -> Option<&str> {
        self.channel.as_deref()
    }

    /// The app id and certificate, when both are set and non-empty.
    pub fn token_credentials(&self) -> Option<(&str, &SecretString)> {
        non_empty_pair(self.app_id.as_deref(), self.app_certificate.as_ref())
    }

    /// True when both the app id and certificate are set, enough to mint tokens.
    pub fn has_token_credentials(&self) -> bool {
        self.token_credentials().is_some()
    }

    /// The customer id and secret used for Basic auth, when both are set and non-empty.
    pub fn rest_credentials(&self) -> Option<(&str, &SecretString)> {
        non_empty_pair(self.customer_id.as_deref(), self.customer_secret.as_ref())
    }

    /// True when REST calls can be authorized, by bearer token or customer credentials.
    pub fn has_rest_credentials(&self) -> bool {
        self.api_bearer_token().is_some() || self.rest_credentials().is_some()
    }

    pub fn runtime_env(&self) -> RustEnv {
        self.runtime_env.clone()
    }

    pub fn is_production(&self) -> bool {
        self.runtime_env() == RustEnv::Production
    }
}
