use crate::error::{Error, Result};
use crate::services::event_verifier::SignaturePolicy;
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub database_url: String,
    pub stripe_secret_key: Option<String>,
    pub stripe_webhook_secret: Option<String>,
    pub signature_policy: SignaturePolicy,
    pub signature_tolerance_secs: i64,
    pub functions_base_url: Option<url::Url>,
    pub service_role_key: Option<String>,
    pub resend_api_key: Option<String>,
    pub email_from: String,
    pub public_rps: u32,
    pub http_timeout_secs: u64,
    pub log_format: LogFormat,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

const DEFAULT_SERVER_ADDRESS: &str = "0.0.0.0:8080";
const DEFAULT_EMAIL_FROM: &str = "Elec-Mate <invoices@elec-mate.com>";

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source. Blank values
    /// count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let functions_base_url = get("FUNCTIONS_BASE_URL")
            .map(|raw| parse_base_url("FUNCTIONS_BASE_URL", &raw))
            .transpose()?;

        Ok(Self {
            server_address: get("SERVER_ADDRESS")
                .unwrap_or_else(|| DEFAULT_SERVER_ADDRESS.to_string()),
            database_url: get("DATABASE_URL").ok_or_else(|| missing("DATABASE_URL"))?,
            stripe_secret_key: get("STRIPE_SECRET_KEY"),
            stripe_webhook_secret: get("STRIPE_CONNECT_WEBHOOK_SECRET"),
            signature_policy: parse_or("STRIPE_WEBHOOK_SIGNATURE_POLICY", get("STRIPE_WEBHOOK_SIGNATURE_POLICY"), SignaturePolicy::Strict)?,
            signature_tolerance_secs: parse_or("STRIPE_WEBHOOK_TOLERANCE_SECS", get("STRIPE_WEBHOOK_TOLERANCE_SECS"), 300)?,
            functions_base_url,
            service_role_key: get("SERVICE_ROLE_KEY"),
            resend_api_key: get("RESEND_API_KEY"),
            email_from: get("EMAIL_FROM").unwrap_or_else(|| DEFAULT_EMAIL_FROM.to_string()),
            public_rps: parse_or("PUBLIC_RPS", get("PUBLIC_RPS"), 20)?,
            http_timeout_secs: parse_or("HTTP_TIMEOUT_SECS", get("HTTP_TIMEOUT_SECS"), 15)?,
            log_format: parse_or("LOG_FORMAT", get("LOG_FORMAT"), LogFormat::Pretty)?,
        })
    }

    /// Resolves an edge function endpoint under `FUNCTIONS_BASE_URL`.
    pub fn function_url(&self, name: &str) -> Option<url::Url> {
        self.functions_base_url
            .as_ref()
            .and_then(|base| base.join(name).ok())
    }
}

fn missing(name: &str) -> Error {
    Error::Config(format!("Missing environment variable: {}", name))
}

fn parse_or<T>(name: &str, raw: Option<String>, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
    }
}

fn parse_base_url(name: &str, raw: &str) -> Result<url::Url> {
    // `Url::join` drops the last segment unless the base ends with a slash.
    let normalized = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{}/", raw)
    };
    url::Url::parse(&normalized)
        .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e)))
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> Result<&'static Config> {
    CONFIG
        .get()
        .ok_or_else(|| Error::Config("Configuration has not been initialized".to_string()))
}
