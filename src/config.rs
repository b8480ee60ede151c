use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;
use url::Url;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub upstream_api_url: Url,
    pub jwt_secret: String,
    pub portal_rps: u32,
    pub upstream_timeout_secs: u64,
    /// Upper bound on students per batch; unbounded when unset.
    pub max_batch_size: Option<usize>,
    pub log_format: LogFormat,
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_address: get_env("SERVER_ADDRESS")?,
            upstream_api_url: get_env_url("UPSTREAM_API_URL")?,
            jwt_secret: get_env("JWT_SECRET")?,
            portal_rps: get_env_parse("PORTAL_RPS")?,
            upstream_timeout_secs: get_env_parse_or("UPSTREAM_TIMEOUT_SECS", 30)?,
            max_batch_size: get_env_parse_opt("MAX_BATCH_SIZE")?,
            log_format: match env::var("LOG_FORMAT").ok().as_deref() {
                Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
                _ => LogFormat::Text,
            },
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(|o| o.trim().to_string())
                        .filter(|o| !o.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
        })
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_parse<T>(name: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = get_env(name)?;
    raw.parse()
        .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e)))
}

fn get_env_parse_opt<T>(name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        _ => Ok(None),
    }
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    Ok(get_env_parse_opt(name)?.unwrap_or(default))
}

fn get_env_url(name: &str) -> Result<Url> {
    let raw = get_env(name)?;
    let url = Url::parse(raw.trim())
        .map_err(|e| Error::Config(format!("Invalid URL for {}: {}", name, e)))?;
    if url.cannot_be_a_base() {
        return Err(Error::Config(format!("{} must be an absolute http(s) URL", name)));
    }
    Ok(url)
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Configuration has not been initialized")
}
