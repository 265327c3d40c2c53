//! Test support shared by the domain crates.
//!
//! [`TestDatabase`] boots a throwaway PostgreSQL container with the retail
//! schema applied. Tests using it need Docker and are `#[ignore]`d:
//!
//! ```rust,no_run
//! use test_utils::TestDatabase;
//!
//! #[tokio::test]
//! #[ignore]
//! async fn upserts_survive_a_second_ingest() {
//!     let db = TestDatabase::new().await;
//!     let owner = db.create_test_user("shop@example.com", "shop").await;
//!     // build a Pg*Repository over db.connection() ...
//! }
//! ```

mod postgres;

pub use postgres::TestDatabase;
