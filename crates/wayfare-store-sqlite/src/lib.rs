//! SQLite backend for the Wayfare travel store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated
//! thread without blocking the async runtime. Every multi-document mutation
//! (create, membership change, delete cascade) runs inside one SQLite
//! transaction, giving the atomic multi-key read-modify-write semantics the
//! membership query depends on.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
