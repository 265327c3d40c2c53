//! PostgreSQL connectivity for the retail services.
//!
//! # Features
//!
//! - `postgres` (default): SeaORM connection pool, migrations, health check
//! - `config`: `core_config::FromEnv` for [`postgres::PostgresConfig`]
//!
//! ```ignore
//! use database::postgres;
//! use migration::Migrator;
//!
//! let db = postgres::connect_from_config_with_retry(PostgresConfig::from_env()?, None).await?;
//! postgres::run_migrations::<Migrator>(&db, "retail_api").await?;
//! ```

pub mod common;

#[cfg(feature = "postgres")]
pub mod postgres;

pub use common::{DatabaseError, DatabaseResult};
