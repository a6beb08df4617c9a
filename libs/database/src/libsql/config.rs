#[cfg(feature = "config")]
use core_config::{ConfigError, FromEnv, env_optional, env_required};

const REMOTE_SCHEMES: [&str; 5] = ["libsql://", "https://", "http://", "wss://", "ws://"];

/// libSQL database configuration
///
/// ```ignore
/// use database::libsql::LibsqlConfig;
///
/// let remote = LibsqlConfig::remote("libsql://shop-catalog.turso.io", "token");
/// let local = LibsqlConfig::local("file:catalog.db");
///
/// // From environment variables (requires `config` feature)
/// let config = LibsqlConfig::from_env()?;
/// ```
#[derive(Clone)]
pub struct LibsqlConfig {
    /// Database URL: a remote endpoint or a local `file:` path
    pub url: String,

    /// Auth token, required for remote databases
    pub auth_token: Option<String>,
}

impl LibsqlConfig {
    pub fn remote(url: impl Into<String>, auth_token: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            auth_token: Some(auth_token.into()),
        }
    }

    pub fn local(path: impl Into<String>) -> Self {
        Self {
            url: path.into(),
            auth_token: None,
        }
    }

    /// Whether the URL points at a remote server rather than a local file.
    pub fn is_remote(&self) -> bool {
        REMOTE_SCHEMES
            .iter()
            .any(|scheme| self.url.starts_with(scheme))
    }

    /// Filesystem path for local databases (`file:` prefix stripped).
    pub fn local_path(&self) -> &str {
        self.url.strip_prefix("file:").unwrap_or(&self.url)
    }
}

impl std::fmt::Debug for LibsqlConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LibsqlConfig")
            .field("url", &self.url)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Load LibsqlConfig from environment variables
///
/// - `TURSO_DATABASE_URL` (required)
/// - `TURSO_AUTH_TOKEN` (required when the URL is remote)
#[cfg(feature = "config")]
impl FromEnv for LibsqlConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            url: env_required("TURSO_DATABASE_URL")?,
            auth_token: env_optional("TURSO_AUTH_TOKEN"),
        };

        if config.is_remote() && config.auth_token.is_none() {
            return Err(ConfigError::MissingEnvVar("TURSO_AUTH_TOKEN".to_string()));
        }

        Ok(config)
    }
}
