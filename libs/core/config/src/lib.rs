pub mod server;
pub mod tracing;

use std::env;
use std::str::FromStr;
use thiserror::Error;

/// Configuration error type
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Environment variable '{0}' is required but not set")]
    MissingEnvVar(String),

    #[error("Failed to parse environment variable '{key}': {details}")]
    ParseError { key: String, details: String },
}

/// Application environment (dev = local, prod = deployed)
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn from_env() -> Self {
        let app_env = env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        if app_env.eq_ignore_ascii_case("production") {
            Environment::Production
        } else {
            Environment::Development
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }
}

/// Name and version of the running binary, reported by `/health`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AppInfo {
    pub name: &'static str,
    pub version: &'static str,
}

/// Builds an [`AppInfo`] from the calling crate's Cargo metadata.
#[macro_export]
macro_rules! app_info {
    () => {
        $crate::AppInfo {
            name: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
        }
    };
}

/// Trait for configuration that can be loaded from environment variables
pub trait FromEnv: Sized {
    fn from_env() -> Result<Self, ConfigError>;
}

/// Helper to load environment variable with a default value
pub fn env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Helper to load environment variable or return error.
///
/// A variable set to an empty string counts as missing.
pub fn env_required(key: &str) -> Result<String, ConfigError> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::MissingEnvVar(key.to_string())),
    }
}

/// Helper to load an optional environment variable (unset and empty both map to `None`)
pub fn env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Parse an environment variable into `T`, falling back to `default` when unset.
pub fn env_parse<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env_optional(key) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::ParseError {
            key: key.to_string(),
            details: e.to_string(),
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_defaults_to_development() {
        temp_env::with_var_unset("APP_ENV", || {
            let env = Environment::from_env();
            assert_eq!(env, Environment::Development);
            assert!(env.is_development());
            assert!(!env.is_production());
        });
    }

    #[test]
    fn test_environment_production_case_insensitive() {
        temp_env::with_var("APP_ENV", Some("PRODUCTION"), || {
            assert_eq!(Environment::from_env(), Environment::Production);
        });

        temp_env::with_var("APP_ENV", Some("Production"), || {
            assert!(Environment::from_env().is_production());
        });
    }

    #[test]
    fn test_environment_unknown_defaults_to_development() {
        temp_env::with_var("APP_ENV", Some("staging"), || {
            assert_eq!(Environment::from_env(), Environment::Development);
        });
    }

    #[test]
    fn test_app_info_macro_uses_crate_metadata() {
        let info = app_info!();
        assert_eq!(info.name, "core_config");
        assert!(!info.version.is_empty());
    }

    #[test]
    fn test_env_or_default() {
        temp_env::with_var("SHOP_TEST_VAR", Some("value"), || {
            assert_eq!(env_or_default("SHOP_TEST_VAR", "default"), "value");
        });
        temp_env::with_var_unset("SHOP_TEST_VAR", || {
            assert_eq!(env_or_default("SHOP_TEST_VAR", "default"), "default");
        });
    }

    #[test]
    fn test_env_required_missing_and_empty() {
        temp_env::with_var_unset("SHOP_REQUIRED", || {
            let err = env_required("SHOP_REQUIRED").unwrap_err();
            assert!(err.to_string().contains("SHOP_REQUIRED"));
            assert!(err.to_string().contains("required"));
        });

        temp_env::with_var("SHOP_REQUIRED", Some("   "), || {
            assert!(matches!(
                env_required("SHOP_REQUIRED"),
                Err(ConfigError::MissingEnvVar(_))
            ));
        });
    }

    #[test]
    fn test_env_required_present() {
        temp_env::with_var("SHOP_REQUIRED", Some("secret"), || {
            assert_eq!(env_required("SHOP_REQUIRED").unwrap(), "secret");
        });
    }

    #[test]
    fn test_env_optional() {
        temp_env::with_var("SHOP_OPTIONAL", Some(""), || {
            assert_eq!(env_optional("SHOP_OPTIONAL"), None);
        });
        temp_env::with_var("SHOP_OPTIONAL", Some("768"), || {
            assert_eq!(env_optional("SHOP_OPTIONAL").as_deref(), Some("768"));
        });
    }

    #[test]
    fn test_env_parse_default_and_value() {
        temp_env::with_var_unset("SHOP_STEPS", || {
            assert_eq!(env_parse("SHOP_STEPS", 15usize).unwrap(), 15);
        });
        temp_env::with_var("SHOP_STEPS", Some(" 7 "), || {
            assert_eq!(env_parse("SHOP_STEPS", 15usize).unwrap(), 7);
        });
    }

    #[test]
    fn test_env_parse_invalid() {
        temp_env::with_var("SHOP_STEPS", Some("many"), || {
            let err = env_parse("SHOP_STEPS", 15usize).unwrap_err();
            assert!(matches!(err, ConfigError::ParseError { ref key, .. } if key == "SHOP_STEPS"));
        });
    }
}
