use libsql::Database;
use tracing::debug;

use crate::common::DatabaseError;

/// Run `SELECT 1` against the database.
///
/// Used by the `/ready` endpoint.
pub async fn check_health(db: &Database) -> Result<(), DatabaseError> {
    debug!("Running libSQL health check");

    let conn = db
        .connect()
        .map_err(|e| DatabaseError::HealthCheckFailed(format!("connect failed: {}", e)))?;
    let mut rows = conn
        .query("SELECT 1", ())
        .await
        .map_err(|e| DatabaseError::HealthCheckFailed(format!("libSQL health check failed: {}", e)))?;

    let row = rows
        .next()
        .await
        .map_err(|e| DatabaseError::HealthCheckFailed(e.to_string()))?
        .ok_or_else(|| DatabaseError::HealthCheckFailed("SELECT 1 returned no rows".to_string()))?;
    let value = row
        .get::<i64>(0)
        .map_err(|e| DatabaseError::HealthCheckFailed(e.to_string()))?;

    if value != 1 {
        return Err(DatabaseError::HealthCheckFailed(format!(
            "SELECT 1 returned unexpected value: {}",
            value
        )));
    }

    debug!("libSQL health check passed");
    Ok(())
}
