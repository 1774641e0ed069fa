//! Lending ledger.
//!
//! Owns the rule `available copies == total copies - active borrows` and
//! every state transition of a borrow record:
//! - Borrow preconditions and due dates
//! - Returns (student and staff paths)
//! - Overdue and days-remaining checks
//! - Review eligibility gated on return history

pub mod clock;
pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::LendingError;
pub use service::LendingService;
pub use types::{
    BorrowRecord, BorrowStatus, CopyCount, DEFAULT_LOAN_PERIOD_DAYS, DEFAULT_MAX_BORROW_LIMIT,
    LendingPolicy,
};
