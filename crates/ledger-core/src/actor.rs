//! Who is performing an operation.
//!
//! Identity is always passed explicitly into ledger operations; nothing reads
//! it from ambient request state.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{CustomerId, EmployeeId};

/// The caller behind a ledger operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Actor {
    /// A teller or administrator.
    Employee(EmployeeId),
    /// An account holder via the customer portal.
    Customer(CustomerId),
    /// A scheduled job.
    System,
}

impl Actor {
    /// Employee id to stamp on ledger rows, if the actor is an employee.
    #[must_use]
    pub const fn employee_id(&self) -> Option<EmployeeId> {
        match self {
            Self::Employee(id) => Some(*id),
            Self::Customer(_) | Self::System => None,
        }
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Employee(id) => write!(f, "employee:{id}"),
            Self::Customer(id) => write!(f, "customer:{id}"),
            Self::System => f.write_str("system"),
        }
    }
}
