//! `SeaORM` entity definitions for the Divvy schema.

pub mod expense_shares;
pub mod expenses;
pub mod group_members;
pub mod groups;
pub mod members;
pub mod sea_orm_active_enums;
pub mod settlements;
