//! Account ledger HTTP API service.
//!
//! This crate exposes the ledger engine over HTTP:
//!
//! - Teller withdrawals and deposits
//! - Fund transfers
//! - Account inquiry, transaction and fee history, reconciliation
//! - Statistics and the nightly maintenance batch
//!
//! # Authentication
//!
//! The service supports two authentication methods:
//!
//! 1. **HS256 JWT tokens** - For employees and customers (`role` claim)
//! 2. **Service API keys** - For schedulers triggering batch jobs

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Health handler needs async for routing

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod response;
pub mod routes;
pub mod run_log;
pub mod state;

pub use config::{ConfigError, ServiceConfig};
pub use error::ApiError;
pub use routes::create_router;
pub use run_log::append_run_log;
pub use state::{build_engine, open_store, AppState};
