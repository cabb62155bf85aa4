//! PostgreSQL adapter for the domain persistence ports.

pub mod error;
pub mod postgres;

pub use error::{PostgresError, Result};
pub use postgres::PostgresStore;
