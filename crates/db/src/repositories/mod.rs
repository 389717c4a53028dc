//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the
//! application. Each repository takes its `DatabaseConnection` by
//! constructor; there is no ambient service container.

pub mod expense;
pub mod member;
pub mod settlement;

pub use expense::{
    ExpenseError, ExpenseInput, ExpenseRepository, ExpenseSummary, ExpenseWithShares,
};
pub use member::{MemberIdentity, MemberRepository};
pub use settlement::{
    MemberBalance, SettlementRepository, SettlementRow, SettlementStoreError,
};
