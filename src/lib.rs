//! SQLite schema catalog and fixture stages for the movies and Shopify datasets.
//!
//! # Intention
//!
//! - Keep physical table names in one registry ([`TableNames`]) passed explicitly.
//! - Build SQL text in pure functions ([`queries`]), binding caller values as parameters.
//! - Wrap one SQLite connection in an async façade ([`Database`]).
//! - Build each dataset through labelled snapshot stages ([`stage`]).
//!
//! # Architectural Boundaries
//!
//! - SQLite does all storage and query execution; nothing here plans or caches queries.
//! - A [`Database`] is owned by one caller at a time. There is no internal locking.

pub mod config;
pub mod error;
pub mod movies;
pub mod queries;
pub mod schema;
pub mod shopify;
pub mod sqlite;
pub mod stage;
pub mod tables;

pub use config::DatabaseConfig;
pub use error::{Error, Result};
pub use sqlite::{ColumnInfo, Database, Params, Row, SqlQuery, Value};
pub use stage::{Pipeline, SqlStage, Stage};
pub use tables::{Table, TableNames};
