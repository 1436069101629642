use crate::{Error, Result};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub const GRAPHQL_URL: &str = "https://public-ubiservices.ubi.com/v1/profiles/me/uplay/graphql";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_INTERVAL_MS: u64 = 250;
const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:129.0) Gecko/20100101 Firefox/129.0";

const HEADER_APP_ID: &str = "ubi-appid";
const HEADER_SESSION_ID: &str = "ubi-sessionid";

/// Credentials and transport settings for [`crate::HttpClient`].
#[derive(Clone)]
pub struct Config {
    pub auth_token: String,
    pub session_id: String,
    pub app_id: String,
    pub graphql_url: String,
    pub request_timeout: Duration,
    /// Minimum spacing between two consecutive requests.
    pub request_interval: Duration,
}

impl Config {
    pub fn new(auth_token: String, session_id: String, app_id: String) -> Self {
        Self {
            auth_token,
            session_id,
            app_id,
            graphql_url: GRAPHQL_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            request_interval: Duration::from_millis(DEFAULT_INTERVAL_MS),
        }
    }

    /// Reads `AUTH_TOKEN`, `SESSION_ID` and `APP_ID`, plus the optional
    /// `UBI_GRAPHQL_URL`, `REQUEST_TIMEOUT_SECS` and `REQUEST_INTERVAL_MS`.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::new(
            required("AUTH_TOKEN")?,
            required("SESSION_ID")?,
            required("APP_ID")?,
        );

        if let Ok(url) = env::var("UBI_GRAPHQL_URL") {
            config.graphql_url = url;
        }
        if let Some(secs) = optional::<u64>("REQUEST_TIMEOUT_SECS")? {
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(ms) = optional::<u64>("REQUEST_INTERVAL_MS")? {
            config.request_interval = Duration::from_millis(ms);
        }

        Ok(config)
    }

    pub fn with_graphql_url(mut self, url: impl Into<String>) -> Self {
        self.graphql_url = url.into();
        self
    }

    pub fn with_request_interval(mut self, interval: Duration) -> Self {
        self.request_interval = interval;
        self
    }

    pub(crate) fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(HEADER_APP_ID, HeaderValue::from_str(&self.app_id)?);
        headers.insert(HEADER_SESSION_ID, HeaderValue::from_str(&self.session_id)?);

        let mut authorization = HeaderValue::from_str(&format!("ubi_v1 t={}", self.auth_token))?;
        authorization.set_sensitive(true);
        headers.insert(AUTHORIZATION, authorization);

        Ok(headers)
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("auth_token", &"<redacted>")
            .field("session_id", &"<redacted>")
            .field("app_id", &self.app_id)
            .field("graphql_url", &self.graphql_url)
            .field("request_timeout", &self.request_timeout)
            .field("request_interval", &self.request_interval)
            .finish()
    }
}

fn required(key: &str) -> Result<String> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(Error::Config(format!("{key} not found in environment"))),
    }
}

fn optional<T: FromStr>(key: &str) -> Result<Option<T>> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| Error::Config(format!("{key} has an invalid value: {value}"))),
        Err(_) => Ok(None),
    }
}
