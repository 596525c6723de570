//! Storage layer for HireLyze.
//!
//! Each logical document collection (`users`, `interviews`, `feedback`,
//! `auth_accounts`) is a SQLite table. This crate owns the connection pool
//! (`r2d2`) and the embedded, versioned migrations that create those tables;
//! the query functions live next to the domain code that uses them.
//!
//! Connections run in WAL mode so page renders can read concurrently while a
//! sign-up writes.

mod migrations;
mod pool;

pub use migrations::{run_migrations, MigrationError};
pub use pool::{create_pool, DbPool, DbRuntimeSettings, PoolError};
