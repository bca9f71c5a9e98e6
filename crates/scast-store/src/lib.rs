//! Storage layer for the Scriptcast backend.
//!
//! This crate provides:
//! - `AccountStore` / `JobStore` / `ArtifactStore` async traits
//! - A Postgres implementation over sqlx (the production store)
//! - An in-memory implementation for tests and DB-less development
//! - Pool construction with `DATABASE_URL` normalization
//!
//! The only concurrency-sensitive primitive is
//! [`AccountStore::deduct`]: both implementations perform the balance
//! check and the decrement as one atomic step, so a balance can never be
//! spent twice or driven negative by concurrent submissions.

pub mod error;
pub mod memory;
pub mod pool;
pub mod postgres;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use pool::{create_pool, normalize_database_url};
pub use postgres::PgStore;
pub use store::{AccountStore, ArtifactStore, DeductOutcome, JobStore};
