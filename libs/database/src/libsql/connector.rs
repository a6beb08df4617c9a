use libsql::{Builder, Database};
use tracing::info;

use super::LibsqlConfig;
use crate::common::{DatabaseError, DatabaseResult, RetryConfig, retry, retry_with_backoff};

/// Open a libSQL database handle.
///
/// Remote URLs need an auth token. Anything else is treated as a local file
/// path (an optional `file:` prefix is stripped).
///
/// ```ignore
/// use database::libsql::{connect, LibsqlConfig};
///
/// let db = connect(&LibsqlConfig::local("file:catalog.db")).await?;
/// let conn = db.connect()?;
/// ```
pub async fn connect(config: &LibsqlConfig) -> DatabaseResult<Database> {
    let db = if config.is_remote() {
        let token = config.auth_token.clone().ok_or_else(|| {
            DatabaseError::ConfigError("auth token is required for remote libSQL".to_string())
        })?;
        info!("Connecting to remote libSQL database at {}", config.url);
        Builder::new_remote(config.url.clone(), token)
            .build()
            .await
            .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?
    } else {
        info!("Opening local libSQL database at {}", config.local_path());
        Builder::new_local(config.local_path())
            .build()
            .await
            .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?
    };

    // Remote builders are lazy; a first connection surfaces bad URLs early.
    db.connect()
        .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;

    info!("libSQL database ready");
    Ok(db)
}

/// Open a libSQL database with exponential backoff on failure.
///
/// `None` uses the default policy (3 retries, 100ms initial delay).
pub async fn connect_with_retry(
    config: &LibsqlConfig,
    retry_config: Option<RetryConfig>,
) -> DatabaseResult<Database> {
    match retry_config {
        Some(policy) => retry_with_backoff(|| connect(config), policy).await,
        None => retry(|| connect(config)).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_local_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.db");
        let config = LibsqlConfig::local(format!("file:{}", path.display()));

        let db = connect(&config).await.unwrap();
        let conn = db.connect().unwrap();
        conn.execute("CREATE TABLE t (id INTEGER)", ()).await.unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_connect_remote_without_token_is_config_error() {
        let config = LibsqlConfig {
            url: "libsql://shop.turso.io".to_string(),
            auth_token: None,
        };
        let err = connect(&config).await.unwrap_err();
        assert!(matches!(err, DatabaseError::ConfigError(_)));
    }

    #[tokio::test]
    async fn test_connect_with_retry_gives_up_on_config_error() {
        let config = LibsqlConfig {
            url: "libsql://shop.turso.io".to_string(),
            auth_token: None,
        };
        let policy = RetryConfig::new()
            .with_max_retries(1)
            .with_initial_delay(1)
            .without_jitter();
        assert!(connect_with_retry(&config, Some(policy)).await.is_err());
    }
}
