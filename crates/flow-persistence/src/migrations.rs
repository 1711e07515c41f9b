//! Runner for the embedded migration set (`migrations/` in this crate).
//!
//! To add a migration: `diesel migration generate <name>` against a real
//! database, then embed the resulting directory here.

use diesel::connection::SimpleConnection;
use diesel::pg::PgConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

use crate::error::PersistenceError;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

pub fn run_pending_migrations(conn: &mut PgConnection) -> Result<(), PersistenceError> {
    conn.batch_execute("CREATE EXTENSION IF NOT EXISTS pgcrypto;").ok();
    conn.run_pending_migrations(MIGRATIONS).map(|_| ()).map_err(|e| PersistenceError::Unknown(format!("migration error: {e}")))
}
