//! # Plinth Database Crate
//!
//! This crate owns everything between the application and PostgreSQL:
//! connection bootstrap and the schema migration engine.
//!
//! ## Architectural Principles
//!
//! - **Explicit collaborators:** Nothing here reads ambient global state.
//!   The connection bootstrap takes its settings as a parameter, the
//!   executor takes its catalog source and its connection as parameters.
//! - **Linear chains only:** Migrations name the revision they depend on,
//!   and the resolver rejects anything that is not a single unbroken
//!   chain. Duplicates, forks, gaps and cycles are all fatal before a
//!   single statement runs.
//! - **Transactional advancement:** A migration run either commits every
//!   pending step plus the new revision marker, or nothing at all.
//!
//! ## Public API
//!
//! - `connect`: establish the connection pool, retrying while the
//!   database comes up.
//! - `clear_schema`: reset the `public` schema to a blank slate.
//! - `migrate` / `Migrator`: advance a database along its upgrade chain.
//! - `Migration`, `MigrationSource`, `ScriptDirectory`, `StaticCatalog`:
//!   the catalog model and its sources.
//! - `DbError`, `MigrationError`: the specific error types returned from
//!   this crate.

// Declare the modules that constitute this crate.
pub mod chain;
pub mod connection;
pub mod error;
pub mod migration;
pub mod migrator;
pub mod source;

// Re-export the key components to create a clean, public-facing API.
pub use connection::{clear_schema, connect};
pub use error::{DbError, MigrationError};
pub use migration::{Migration, UpgradeAction, UpgradeFn};
pub use migrator::{migrate, Migrator};
pub use source::{MigrationSource, ScriptDirectory, StaticCatalog};
