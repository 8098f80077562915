use crate::config::types::{Config, SeedEntry, WarmerConfig};
use crate::ConfigError;
use std::collections::HashMap;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_warmer_config(&config.warmer)?;
    validate_cache_headers(&config.cache_headers)?;
    validate_seeds(&config.seeds)?;
    Ok(())
}

/// Validates warmer configuration
fn validate_warmer_config(config: &WarmerConfig) -> Result<(), ConfigError> {
    validate_base_url(&config.base_url)?;

    if config.batch_size < 1 {
        return Err(ConfigError::Validation(format!(
            "batch-size must be >= 1, got {}",
            config.batch_size
        )));
    }

    for base in &config.allowed_base_urls {
        validate_base_url(base)?;
    }

    Ok(())
}

/// Validates that a base URL is absolute http(s) with a host
fn validate_base_url(base: &str) -> Result<(), ConfigError> {
    let url =
        Url::parse(base).map_err(|e| ConfigError::InvalidUrl(format!("'{}': {}", base, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "Base URL '{}' must use the http or https scheme",
            base
        )));
    }

    if !url.has_host() {
        return Err(ConfigError::Validation(format!(
            "Base URL '{}' must name a host",
            base
        )));
    }

    Ok(())
}

/// Validates cache header rules
fn validate_cache_headers(rules: &HashMap<String, Vec<String>>) -> Result<(), ConfigError> {
    for (header, values) in rules {
        if header.trim().is_empty() {
            return Err(ConfigError::Validation(
                "cache-headers names cannot be empty".to_string(),
            ));
        }

        if values.is_empty() {
            return Err(ConfigError::Validation(format!(
                "cache-headers entry '{}' must list at least one value substring",
                header
            )));
        }
    }

    Ok(())
}

/// Validates seed entries
fn validate_seeds(seeds: &[SeedEntry]) -> Result<(), ConfigError> {
    for seed in seeds {
        if seed.path.trim().is_empty() {
            return Err(ConfigError::Validation(
                "Seed paths cannot be empty".to_string(),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            warmer: WarmerConfig {
                base_url: "https://shop.example.com".to_string(),
                batch_size: 10,
                allowed_base_urls: vec!["https://cdn.example.com".to_string()],
            },
            cache_headers: HashMap::new(),
            seeds: vec![SeedEntry {
                path: "/".to_string(),
                invalidate: false,
            }],
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(validate(&base_config()).is_ok());
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let mut config = base_config();
        config.warmer.batch_size = 0;
        assert!(matches!(
            validate(&config),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let mut config = base_config();
        config.warmer.base_url = "not a url".to_string();
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn test_non_http_scheme_rejected() {
        let mut config = base_config();
        config.warmer.base_url = "ftp://example.com".to_string();
        assert!(matches!(
            validate(&config),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_invalid_allowed_base_url_rejected() {
        let mut config = base_config();
        config.warmer.allowed_base_urls.push("cdn.example.com".to_string());
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_empty_seed_path_rejected() {
        let mut config = base_config();
        config.seeds.push(SeedEntry {
            path: "   ".to_string(),
            invalidate: true,
        });
        assert!(matches!(
            validate(&config),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_empty_header_value_list_rejected() {
        let mut config = base_config();
        config
            .cache_headers
            .insert("x-cache".to_string(), vec![]);
        assert!(matches!(
            validate(&config),
            Err(ConfigError::Validation(_))
        ));
    }
}
