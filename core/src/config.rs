//! Backend location and client settings, read from the environment.
//!
//! Web builds read `NEXT_PUBLIC_BACKEND_URL`, mobile builds
//! `EXPO_PUBLIC_BACKEND_URL`; both fall back to `BACKEND_URL` and then to a
//! local development backend. The base URL always ends in `/api/v1`.

use std::time::Duration;

use crate::error::ConfigError;

pub const API_PREFIX: &str = "/api/v1";
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub const WEB_BACKEND_URL_VAR: &str = "NEXT_PUBLIC_BACKEND_URL";
pub const MOBILE_BACKEND_URL_VAR: &str = "EXPO_PUBLIC_BACKEND_URL";
pub const BACKEND_URL_VAR: &str = "BACKEND_URL";
pub const TIMEOUT_VAR: &str = "HF_HTTP_TIMEOUT_SECS";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Web,
    Mobile,
}

impl Platform {
    /// Environment variables consulted for the backend URL, highest priority first.
    pub fn url_vars(&self) -> [&'static str; 2] {
        match self {
            Platform::Web => [WEB_BACKEND_URL_VAR, BACKEND_URL_VAR],
            Platform::Mobile => [MOBILE_BACKEND_URL_VAR, BACKEND_URL_VAR],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdkConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl SdkConfig {
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: normalize_base_url(base_url)?,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    pub fn from_env(platform: Platform) -> Result<Self, ConfigError> {
        Self::from_lookup(platform, |key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary variable source. Blank values count
    /// as unset.
    pub fn from_lookup<F>(platform: Platform, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let raw_url = platform
            .url_vars()
            .iter()
            .find_map(|key| get(key))
            .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string());

        let timeout = match get(TIMEOUT_VAR) {
            Some(value) => {
                let secs = value
                    .trim()
                    .parse::<u64>()
                    .map_err(|_| ConfigError::InvalidTimeout { value: value.clone() })?;
                Duration::from_secs(secs)
            }
            None => DEFAULT_TIMEOUT,
        };

        Ok(Self {
            base_url: normalize_base_url(&raw_url)?,
            timeout,
        })
    }
}

/// Strip trailing slashes and make sure the URL ends with `/api/v1`: a bare
/// `/api` root gains `/v1`, any other root gains `/api/v1`. Applying it twice
/// gives the same result as applying it once.
pub fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(ConfigError::MissingBaseUrl);
    }
    if trimmed.ends_with(API_PREFIX) {
        Ok(trimmed.to_string())
    } else if trimmed.ends_with("/api") {
        Ok(format!("{trimmed}/v1"))
    } else {
        Ok(format!("{trimmed}{API_PREFIX}"))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn appends_api_prefix() {
        assert_eq!(normalize_base_url("http://x/api").unwrap(), "http://x/api/v1");
        assert_eq!(normalize_base_url("http://x/api/").unwrap(), "http://x/api/v1");
        assert_eq!(normalize_base_url("http://x").unwrap(), "http://x/api/v1");
    }

    #[test]
    fn normalization_is_idempotent() {
        assert_eq!(normalize_base_url("http://x/api/v1").unwrap(), "http://x/api/v1");
        let once = normalize_base_url("http://x/").unwrap();
        assert_eq!(normalize_base_url(&once).unwrap(), once);
    }

    #[test]
    fn trailing_slashes_are_stripped() {
        assert_eq!(normalize_base_url("http://x/api/v1///").unwrap(), "http://x/api/v1");
    }

    #[test]
    fn blank_url_is_rejected() {
        assert_eq!(normalize_base_url("   "), Err(ConfigError::MissingBaseUrl));
    }

    #[test]
    fn web_prefers_public_var() {
        let config = SdkConfig::from_lookup(
            Platform::Web,
            lookup(&[("NEXT_PUBLIC_BACKEND_URL", "https://web.example"), ("BACKEND_URL", "https://other")]),
        )
        .unwrap();
        assert_eq!(config.base_url, "https://web.example/api/v1");
    }

    #[test]
    fn mobile_ignores_web_var() {
        let config = SdkConfig::from_lookup(
            Platform::Mobile,
            lookup(&[("NEXT_PUBLIC_BACKEND_URL", "https://web.example"), ("BACKEND_URL", "https://shared/")]),
        )
        .unwrap();
        assert_eq!(config.base_url, "https://shared/api/v1");
    }

    #[test]
    fn falls_back_to_local_backend() {
        let config = SdkConfig::from_lookup(Platform::Mobile, lookup(&[("EXPO_PUBLIC_BACKEND_URL", " ")])).unwrap();
        assert_eq!(config.base_url, "http://localhost:8000/api/v1");
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn timeout_override() {
        let config = SdkConfig::from_lookup(Platform::Web, lookup(&[("HF_HTTP_TIMEOUT_SECS", "5")])).unwrap();
        assert_eq!(config.timeout, Duration::from_secs(5));

        let err = SdkConfig::from_lookup(Platform::Web, lookup(&[("HF_HTTP_TIMEOUT_SECS", "soon")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTimeout { .. }));
    }
}
