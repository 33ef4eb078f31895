use reqwest::Url;

use super::{types::Config, ConfigError};

/// Validate configuration.
///
/// Everything checked here is fatal and must fail before any network call:
/// - A non-empty signing secret is configured
/// - The base URL parses and uses http or https
/// - Poll interval, deadline and timeouts are non-zero
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    match config.service.secret.as_deref() {
        Some(secret) if !secret.is_empty() => {}
        _ => {
            return Err(ConfigError::ValidationError(
                "service.secret must be set (or VIDGEN_SERVICE__SECRET)".to_string(),
            ))
        }
    }

    let url = Url::parse(&config.service.base_url).map_err(|e| {
        ConfigError::ValidationError(format!(
            "service.base_url {:?} is not a valid URL: {}",
            config.service.base_url, e
        ))
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::ValidationError(format!(
            "service.base_url must use http or https, got {}",
            url.scheme()
        )));
    }

    if config.poll.interval_ms == 0 {
        return Err(ConfigError::ValidationError(
            "poll.interval_ms cannot be 0".to_string(),
        ));
    }
    if config.poll.deadline_secs == 0 {
        return Err(ConfigError::ValidationError(
            "poll.deadline_secs cannot be 0".to_string(),
        ));
    }

    let timeouts = &config.timeouts;
    if timeouts.request_timeout_secs == 0
        || timeouts.connect_timeout_secs == 0
        || timeouts.download_inactivity_secs == 0
    {
        return Err(ConfigError::ValidationError(
            "timeouts cannot be 0".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{OutputConfig, PollConfig, ServiceConfig, TimeoutConfig};

    fn config(base_url: &str, secret: Option<&str>) -> Config {
        Config {
            service: ServiceConfig {
                base_url: base_url.to_string(),
                secret: secret.map(str::to_string),
            },
            timeouts: TimeoutConfig::default(),
            poll: PollConfig::default(),
            output: OutputConfig::default(),
        }
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(validate_config(&config("http://localhost:3000", Some("k"))).is_ok());
        assert!(validate_config(&config("https://jobs.example.com/api", Some("k"))).is_ok());
    }

    #[test]
    fn test_validate_missing_secret_fails() {
        let err = validate_config(&config("http://localhost:3000", None)).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
        assert!(err.to_string().contains("service.secret"));
    }

    #[test]
    fn test_validate_empty_secret_fails() {
        let result = validate_config(&config("http://localhost:3000", Some("")));
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_malformed_url_fails() {
        let result = validate_config(&config("not a url", Some("k")));
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_non_http_scheme_fails() {
        let err = validate_config(&config("ftp://localhost", Some("k"))).unwrap_err();
        assert!(err.to_string().contains("http or https"));
    }

    #[test]
    fn test_validate_zero_interval_fails() {
        let mut cfg = config("http://localhost:3000", Some("k"));
        cfg.poll.interval_ms = 0;
        assert!(matches!(
            validate_config(&cfg),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_validate_zero_timeout_fails() {
        let mut cfg = config("http://localhost:3000", Some("k"));
        cfg.timeouts.download_inactivity_secs = 0;
        assert!(matches!(
            validate_config(&cfg),
            Err(ConfigError::ValidationError(_))
        ));
    }
}
