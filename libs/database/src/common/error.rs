use thiserror::Error;

/// Failures of the connection helpers; query errors stay `DbErr` in the repositories.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("database unreachable after {attempts} attempts: {reason}")]
    Unreachable { attempts: u32, reason: String },

    #[error("database is not healthy: {0}")]
    Unhealthy(String),

    #[error("migrations failed: {0}")]
    Migration(String),
}

pub type DatabaseResult<T> = Result<T, DatabaseError>;
