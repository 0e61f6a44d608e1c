//! db-charter: run SQL against MySQL or SQLite and derive chart
//! specifications from the results.
//!
//! The crate is organized around a handful of seams:
//! - [`config`] resolves connection parameters from flags, files, and
//!   the environment,
//! - [`db`] holds the backend clients behind the [`db::DatabaseClient`]
//!   trait and the normalized result model,
//! - [`chart`] turns query results into bar and pie chart specs,
//! - [`api`] is the transport-agnostic session and response layer the
//!   binary (or any server frontend) drives.

pub mod api;
pub mod chart;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
