//! `SeaORM` enum mappings for Postgres enum types.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Spending category of an expense.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "expense_category")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExpenseCategory {
    /// Meals and drinks.
    #[sea_orm(string_value = "food")]
    Food,
    /// Trains, buses, taxis, fuel.
    #[sea_orm(string_value = "transport")]
    Transport,
    /// Hotels and other lodging.
    #[sea_orm(string_value = "accommodation")]
    Accommodation,
    /// Shopping.
    #[sea_orm(string_value = "shopping")]
    Shopping,
    /// Tours, tickets, activities.
    #[sea_orm(string_value = "activity")]
    Activity,
    /// Anything else.
    #[sea_orm(string_value = "etc")]
    Etc,
}
