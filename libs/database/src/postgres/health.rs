use sea_orm::{ConnectionTrait, DatabaseConnection};

use crate::common::DatabaseError;

/// Round-trip to the server; used by the readiness probe.
pub async fn check_health(db: &DatabaseConnection) -> Result<(), DatabaseError> {
    db.execute_unprepared("SELECT 1")
        .await
        .map(|_| tracing::trace!("PostgreSQL ping ok"))
        .map_err(|e| DatabaseError::Unhealthy(e.to_string()))
}
