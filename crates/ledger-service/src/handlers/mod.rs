//! API handlers.

pub mod accounts;
pub mod health;
pub mod jobs;
pub mod reports;
pub mod teller;
pub mod transfers;
