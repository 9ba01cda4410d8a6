//! Durable storage for downtime intervals and status samples
//!
//! This module provides a trait-based abstraction so the monitor and the
//! query facade never depend on a concrete database.
//!
//! ## Backends
//!
//! - **SQLite** (default): embedded database file, created on first use
//! - **In-Memory**: no persistence, for running without SQLite and for tests
//!
//! ## Usage
//!
//! ```no_run
//! use heimdall::storage::{StorageBackend, sqlite::SqliteBackend};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let backend = SqliteBackend::new("./heimdall.db").await?;
//!     let stats = backend.uptime_stats(chrono::Utc::now(), 10).await?;
//!     println!("{stats:?}");
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod error;
pub mod memory;
pub mod schema;
#[cfg(feature = "storage-sqlite")]
pub mod sqlite;

pub use backend::{HealthStatus, StorageBackend};
pub use error::{StorageError, StorageResult};
pub use schema::{DowntimeRow, StatusSample, UptimeStats};
