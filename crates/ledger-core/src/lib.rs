//! Core types and rules for the account ledger.
//!
//! This crate provides the pure, I/O-free parts of the engine:
//!
//! - **Identifiers**: `AccountId`, `TransactionId`, `CustomerId`, `EmployeeId`, `RunId`
//! - **Accounts**: `Account`, `AccountStatus`, `ArchivedAccount`
//! - **Ledger**: `Transaction`, `TransactionType`, `TypeCatalog`
//! - **Rules**: `Lifecycle` (status state machine), `fees::decide` (fee scheduling)
//! - **Policy**: `LedgerPolicy` tunables, `Clock`
//!
//! # Amounts
//!
//! All amounts are `i64` integer cents. Balances are never stored; they are
//! always the catalog-signed sum of an account's transactions.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod account;
pub mod actor;
pub mod archive;
pub mod balance;
pub mod calendar;
pub mod clock;
pub mod error;
pub mod fees;
pub mod ids;
pub mod lifecycle;
pub mod money;
pub mod policy;
pub mod transaction;

pub use account::{Account, AccountStatus, NewAccount, MINIMUM_POSITIVE_BALANCE_CENTS};
pub use actor::Actor;
pub use archive::ArchivedAccount;
pub use balance::{Sign, TypeCatalog, TypeTotal, REQUIRED_TYPES};
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{ensure_positive, LedgerError, Result};
pub use fees::{FeeCategory, FeeCharge, FeeDecision, FeeDue, NewFeeCharge};
pub use ids::{AccountId, CustomerId, EmployeeId, FeeChargeId, IdError, RunId, TransactionId};
pub use lifecycle::{FlagReason, Lifecycle, Transition, Trigger};
pub use money::{add_cents, format_cents, MAX_AMOUNT_CENTS};
pub use policy::LedgerPolicy;
pub use transaction::{generate_reference, NewTransaction, Transaction, TransactionType};
