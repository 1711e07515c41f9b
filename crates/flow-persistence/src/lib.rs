//! Postgres-backed [`flow_core::store::DurableStore`].
//!
//! Modules:
//! - `schema`: hand-written Diesel tables for the `flows`/`blocks`/
//!   `execution_logs` document-store collections.
//! - `models`: row types plus their conversions to/from the domain types.
//! - `pg`: the `DurableStore` implementation and connection-pool helpers.
//! - `migrations`: embedded migration runner.
//! - `config`: env-based connection configuration.

pub mod config;
pub mod error;
pub mod migrations;
pub mod models;
pub mod pg;
pub mod schema;

pub use config::init_dotenv;
pub use error::PersistenceError;
pub use pg::{build_dev_pool_from_env, build_pool, ConnectionProvider, PgPool, PgStore, PoolProvider};
