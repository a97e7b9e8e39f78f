//! Configuration types.

use rust_decimal::Decimal;
use secrecy::SecretString;

use crate::error::ConfigError;
use crate::intake::workflow::DEFAULT_FARM_ACRES;
use crate::llm::LlmConfig;

/// Model used for yield prediction.
pub const DEFAULT_YIELD_MODEL: &str = "openai/gpt-oss-120b";
/// Vision-capable model used by the plant doctor.
pub const DEFAULT_VISION_MODEL: &str = "meta-llama/llama-4-maverick-17b-128e-instruct";

/// Where the farm REST services live.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Base URL for `/loan/*` and `/insurance/*`.
    pub backend_url: String,
    /// Base URL for `/ai/analyze`.
    pub api_url: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:5000".to_string(),
            api_url: "http://localhost:5000/api".to_string(),
        }
    }
}

/// Default Hindi/English translation endpoint.
pub const DEFAULT_TRANSLATE_URL: &str = "https://translate.googleapis.com/translate_a/single";

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub backend: BackendConfig,
    pub llm: LlmConfig,
    /// Farmer identity attached to every submission from this process.
    pub farmer_id: String,
    pub farmer_name: String,
    /// Farm size sent with loan applications.
    pub farm_acres: Decimal,
    /// Translate general chat between Hindi and English.
    pub translate_enabled: bool,
    pub translate_url: String,
    pub http_enabled: bool,
    pub http_port: u16,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("GROQ_API_KEY")
            .map_err(|_| ConfigError::MissingEnvVar("GROQ_API_KEY".to_string()))?;

        let defaults = BackendConfig::default();
        let backend = BackendConfig {
            backend_url: env_or("KISAAN_BACKEND_URL", &defaults.backend_url),
            api_url: env_or("KISAAN_API_URL", &defaults.api_url),
        };

        let llm = LlmConfig {
            api_key: SecretString::from(api_key),
            yield_model: env_or("KISAAN_YIELD_MODEL", DEFAULT_YIELD_MODEL),
            vision_model: env_or("KISAAN_VISION_MODEL", DEFAULT_VISION_MODEL),
        };

        Ok(Self {
            backend,
            llm,
            farmer_id: env_or("KISAAN_FARMER_ID", "local-farmer"),
            farmer_name: env_or("KISAAN_FARMER_NAME", "Farmer"),
            farm_acres: parse_acres(
                "KISAAN_FARM_ACRES",
                std::env::var("KISAAN_FARM_ACRES").ok(),
            )?,
            translate_enabled: parse_bool(
                "KISAAN_TRANSLATE",
                std::env::var("KISAAN_TRANSLATE").ok(),
                true,
            )?,
            translate_url: env_or("KISAAN_TRANSLATE_URL", DEFAULT_TRANSLATE_URL),
            http_enabled: parse_bool(
                "KISAAN_HTTP_ENABLED",
                std::env::var("KISAAN_HTTP_ENABLED").ok(),
                true,
            )?,
            http_port: parse_port(
                "KISAAN_HTTP_PORT",
                std::env::var("KISAAN_HTTP_PORT").ok(),
                8080,
            )?,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_port(key: &str, raw: Option<String>, default: u16) -> Result<u16, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("{value:?} is not a port: {e}"),
            }),
    }
}

fn parse_acres(key: &str, raw: Option<String>) -> Result<Decimal, ConfigError> {
    let Some(value) = raw else {
        return Ok(DEFAULT_FARM_ACRES);
    };
    match value.trim().parse::<Decimal>() {
        Ok(acres) if acres > Decimal::ZERO => Ok(acres),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected a positive number of acres, got {value:?}"),
        }),
    }
}

fn parse_bool(key: &str, raw: Option<String>, default: bool) -> Result<bool, ConfigError> {
    let Some(value) = raw else {
        return Ok(default);
    };
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected true/false, got {other:?}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_defaults_when_unset() {
        assert_eq!(parse_port("P", None, 8080).unwrap(), 8080);
    }

    #[test]
    fn port_rejects_garbage() {
        let err = parse_port("KISAAN_HTTP_PORT", Some("eighty".into()), 8080).unwrap_err();
        assert!(err.to_string().contains("KISAAN_HTTP_PORT"));
    }

    #[test]
    fn bool_accepts_common_spellings() {
        assert!(parse_bool("B", Some("YES".into()), false).unwrap());
        assert!(!parse_bool("B", Some("off".into()), true).unwrap());
        assert!(parse_bool("B", Some("maybe".into()), true).is_err());
    }

    #[test]
    fn acres_default_to_five_and_must_be_positive() {
        assert_eq!(parse_acres("A", None).unwrap(), Decimal::from(5));
        assert_eq!(
            parse_acres("A", Some(" 2.5 ".into())).unwrap(),
            Decimal::new(25, 1)
        );
        assert!(parse_acres("A", Some("0".into())).is_err());
        assert!(parse_acres("A", Some("lots".into())).is_err());
    }

    #[test]
    fn backend_defaults_point_at_local_server() {
        let defaults = BackendConfig::default();
        assert!(defaults.api_url.ends_with("/api"));
        assert!(!defaults.backend_url.ends_with("/api"));
    }
}
