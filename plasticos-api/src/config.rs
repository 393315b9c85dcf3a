//! CORS and rate-limit settings for the HTTP surface (spec's "ambient
//! stack", not `PlasticConfig` — that one lives in `plasticos-core` and
//! governs the research/matching core, not request handling).

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Allowed CORS origins. Empty means allow all (dev mode).
    pub cors_origins: Vec<String>,
    pub cors_allow_credentials: bool,
    pub cors_max_age_secs: u64,

    pub rate_limit_enabled: bool,
    /// Requests per minute, per client IP.
    pub rate_limit_per_minute: u32,
    pub rate_limit_burst: u32,
    pub rate_limit_window: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            cors_origins: Vec::new(),
            cors_allow_credentials: false,
            cors_max_age_secs: 86400,

            rate_limit_enabled: true,
            rate_limit_per_minute: 120,
            rate_limit_burst: 20,
            rate_limit_window: Duration::from_secs(60),
        }
    }
}

impl ApiConfig {
    /// Reads `PLASTICOS_API_CORS_ORIGINS`, `PLASTICOS_API_CORS_ALLOW_CREDENTIALS`,
    /// `PLASTICOS_API_CORS_MAX_AGE_SECS`, `PLASTICOS_API_RATE_LIMIT_ENABLED`,
    /// `PLASTICOS_API_RATE_LIMIT_PER_MINUTE`, `PLASTICOS_API_RATE_LIMIT_BURST`.
    pub fn from_env() -> Self {
        let cors_origins = std::env::var("PLASTICOS_API_CORS_ORIGINS")
            .ok()
            .map(|s| s.split(',').map(|o| o.trim().to_string()).filter(|o| !o.is_empty()).collect())
            .unwrap_or_default();

        let cors_allow_credentials = std::env::var("PLASTICOS_API_CORS_ALLOW_CREDENTIALS")
            .ok()
            .map(|s| s.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let cors_max_age_secs = std::env::var("PLASTICOS_API_CORS_MAX_AGE_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(86400);

        let rate_limit_enabled = std::env::var("PLASTICOS_API_RATE_LIMIT_ENABLED")
            .ok()
            .map(|s| !s.eq_ignore_ascii_case("false"))
            .unwrap_or(true);

        let rate_limit_per_minute = std::env::var("PLASTICOS_API_RATE_LIMIT_PER_MINUTE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(120);

        let rate_limit_burst = std::env::var("PLASTICOS_API_RATE_LIMIT_BURST")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(20);

        Self {
            cors_origins,
            cors_allow_credentials,
            cors_max_age_secs,
            rate_limit_enabled,
            rate_limit_per_minute,
            rate_limit_burst,
            rate_limit_window: Duration::from_secs(60),
        }
    }

    pub fn is_production(&self) -> bool {
        !self.cors_origins.is_empty()
    }

    pub fn is_origin_allowed(&self, origin: &str) -> bool {
        if self.cors_origins.is_empty() {
            return true;
        }

        self.cors_origins.iter().any(|allowed| {
            if allowed == origin {
                return true;
            }
            if let Some(pattern) = allowed.strip_prefix("*.") {
                if let Some(origin_domain) = origin.strip_prefix("https://") {
                    return origin_domain.ends_with(pattern)
                        || origin_domain == pattern.strip_prefix('.').unwrap_or(pattern);
                }
            }
            false
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_dev_permissive() {
        let config = ApiConfig::default();
        assert!(config.cors_origins.is_empty());
        assert!(!config.cors_allow_credentials);
        assert!(config.rate_limit_enabled);
        assert_eq!(config.rate_limit_per_minute, 120);
    }

    #[test]
    fn is_production_reflects_explicit_origins() {
        let mut config = ApiConfig::default();
        assert!(!config.is_production());
        config.cors_origins = vec!["https://brokerage.example".to_string()];
        assert!(config.is_production());
    }

    #[test]
    fn origin_allowed_dev_mode_allows_anything() {
        let config = ApiConfig::default();
        assert!(config.is_origin_allowed("https://anything.example"));
    }

    #[test]
    fn origin_allowed_production_is_exact_or_wildcard() {
        let mut config = ApiConfig::default();
        config.cors_origins =
            vec!["https://brokerage.example".to_string(), "*.brokerage.example".to_string()];

        assert!(config.is_origin_allowed("https://brokerage.example"));
        assert!(config.is_origin_allowed("https://app.brokerage.example"));
        assert!(!config.is_origin_allowed("https://evil.example"));
    }
}
