use crate::taxonomy::CanonicalCategory;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("config file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{0} is required (set it in the config file or the environment)")]
    Missing(&'static str),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Matching thresholds and fallback for the taxonomy resolver.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TaxonomyConfig {
    pub category_threshold: f64,
    pub feature_threshold: f64,
    pub default_category: CanonicalCategory,
}

impl Default for TaxonomyConfig {
    fn default() -> Self {
        Self {
            category_threshold: 0.7,
            feature_threshold: 0.8,
            default_category: CanonicalCategory::Apartments,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub strapi_url: String,
    pub strapi_api_token: String,
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub default_locale: String,
    pub secondary_locale: String,
    pub delay_between_sources_ms: u64,
    pub request_timeout_seconds: u64,
    pub max_content_length: usize,
    pub page_size: u32,
    pub debug_html_dir: Option<String>,
    pub taxonomy: TaxonomyConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            strapi_url: "http://localhost:1337".into(),
            strapi_api_token: String::new(),
            gemini_api_key: String::new(),
            gemini_model: "gemini-2.5-flash".into(),
            gemini_base_url: "https://generativelanguage.googleapis.com".into(),
            default_locale: "es".into(),
            secondary_locale: "en".into(),
            delay_between_sources_ms: 2000,
            request_timeout_seconds: 60,
            max_content_length: 5000,
            page_size: 1000,
            debug_html_dir: Some("logs/html".into()),
            taxonomy: TaxonomyConfig::default(),
        }
    }
}

impl AppConfig {
    /// Applies overrides from `lookup` (the process environment in production).
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let set = |target: &mut String, key: &str| {
            if let Some(value) = lookup(key).filter(|v| !v.trim().is_empty()) {
                *target = value;
            }
        };
        set(&mut self.strapi_url, "STRAPI_URL");
        set(&mut self.strapi_api_token, "STRAPI_API_TOKEN");
        set(&mut self.gemini_api_key, "GEMINI_API_KEY");
        set(&mut self.gemini_model, "GEMINI_MODEL");
        set(&mut self.default_locale, "DEFAULT_LOCALE");
        set(&mut self.secondary_locale, "SECONDARY_LOCALE");
    }

    /// Checks everything the CMS-facing commands need.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.strapi_api_token.trim().is_empty() {
            return Err(ConfigError::Missing("STRAPI_API_TOKEN"));
        }
        if self.default_locale == self.secondary_locale {
            return Err(ConfigError::Invalid(
                "default_locale and secondary_locale must differ".into(),
            ));
        }
        for (name, value) in [
            ("category_threshold", self.taxonomy.category_threshold),
            ("feature_threshold", self.taxonomy.feature_threshold),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(ConfigError::Invalid(format!(
                    "{} must be in (0, 1], got {}",
                    name, value
                )));
            }
        }
        if self.page_size == 0 {
            return Err(ConfigError::Invalid("page_size must be positive".into()));
        }
        Ok(())
    }

    pub fn require_ai_key(&self) -> Result<(), ConfigError> {
        if self.gemini_api_key.trim().is_empty() {
            return Err(ConfigError::Missing("GEMINI_API_KEY"));
        }
        Ok(())
    }
}

/// Reads the JSON config at `path` (defaults when the file does not exist), then applies
/// `.env` and process environment overrides.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let mut config = read_config_file(path)?;
    dotenvy::dotenv().ok();
    config.apply_overrides(|key| std::env::var(key).ok());
    Ok(config)
}

fn read_config_file(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        info!("Config file {} not found, using defaults", path.display());
        return Ok(AppConfig::default());
    }
    let content = fs::read_to_string(path)?;
    let config: AppConfig = serde_json::from_str(&content)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"strapi_url": "https://cms.example.com", "taxonomy": {{"feature_threshold": 0.85}}}}"#
        )
        .unwrap();

        let config = read_config_file(file.path()).unwrap();
        assert_eq!(config.strapi_url, "https://cms.example.com");
        assert_eq!(config.taxonomy.feature_threshold, 0.85);
        assert_eq!(config.taxonomy.category_threshold, 0.7);
        assert_eq!(config.default_locale, "es");
        assert_eq!(config.delay_between_sources_ms, 2000);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = read_config_file(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config.gemini_model, "gemini-2.5-flash");
        assert_eq!(config.taxonomy.default_category, CanonicalCategory::Apartments);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        assert!(matches!(read_config_file(file.path()), Err(ConfigError::Json(_))));
    }

    #[test]
    fn environment_overrides_secrets() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("STRAPI_API_TOKEN", "token-123"),
            ("GEMINI_API_KEY", "key-456"),
            ("STRAPI_URL", "   "),
        ]);
        let mut config = AppConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.strapi_api_token, "token-123");
        assert_eq!(config.gemini_api_key, "key-456");
        assert_eq!(config.strapi_url, "http://localhost:1337");
        assert!(config.validate().is_ok());
        assert!(config.require_ai_key().is_ok());
    }

    #[test]
    fn validation_rejects_bad_values() {
        let config = AppConfig::default();
        assert!(matches!(config.validate(), Err(ConfigError::Missing("STRAPI_API_TOKEN"))));

        let mut config = AppConfig {
            strapi_api_token: "t".into(),
            ..AppConfig::default()
        };
        config.taxonomy.feature_threshold = 1.5;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        config.taxonomy.feature_threshold = 0.8;
        config.secondary_locale = "es".into();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}
