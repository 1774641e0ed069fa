//! Active enums stored as strings.

use libris_core::lending::BorrowStatus as CoreBorrowStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Borrow record status column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
pub enum BorrowStatus {
    /// Out with the student.
    #[sea_orm(string_value = "borrowed")]
    Borrowed,
    /// Back on the shelf.
    #[sea_orm(string_value = "returned")]
    Returned,
}

impl From<BorrowStatus> for CoreBorrowStatus {
    fn from(status: BorrowStatus) -> Self {
        match status {
            BorrowStatus::Borrowed => Self::Borrowed,
            BorrowStatus::Returned => Self::Returned,
        }
    }
}

impl From<CoreBorrowStatus> for BorrowStatus {
    fn from(status: CoreBorrowStatus) -> Self {
        match status {
            CoreBorrowStatus::Borrowed => Self::Borrowed,
            CoreBorrowStatus::Returned => Self::Returned,
        }
    }
}
