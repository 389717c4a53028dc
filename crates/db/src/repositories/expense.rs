//! Expense repository: the ledger store plus the optimistic-version
//! retry guard around expense mutations.
//!
//! Mutations follow a fixed protocol: validate everything first (fail
//! fast, no partial writes), then replace child shares and commit the
//! parent inside one database transaction. Updates additionally carry a
//! version precondition; see [`ExpenseRepository::update_expense`].

use std::collections::HashMap;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveEnum, ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tracing::{info, warn};
use uuid::Uuid;

use divvy_core::split::{self, SplitError};
use divvy_shared::types::MemberId;
use divvy_shared::AppError;

use crate::entities::{
    expense_shares, expenses, groups, members, sea_orm_active_enums::ExpenseCategory,
};

/// Total commit attempts per update, including the first one.
const UPDATE_ATTEMPTS: u32 = 3;

/// Fixed delay between attempts after a version conflict.
const UPDATE_RETRY_DELAY: Duration = Duration::from_millis(1000);

/// Error types for expense operations.
#[derive(Debug, thiserror::Error)]
pub enum ExpenseError {
    /// Expense not found.
    #[error("Expense not found: {0}")]
    NotFound(Uuid),

    /// Group not found.
    #[error("Group not found: {0}")]
    GroupNotFound(Uuid),

    /// Payer not found in the member directory.
    #[error("Payer not found: {0}")]
    PayerNotFound(Uuid),

    /// The expense belongs to a different group than the one addressed.
    /// Reported as not-found at the boundary so callers cannot probe
    /// cross-group existence.
    #[error("Expense {expense_id} not found in group {group_id}")]
    GroupMismatch {
        /// The addressed expense.
        expense_id: Uuid,
        /// The group the caller addressed it through.
        group_id: Uuid,
    },

    /// Some requested participant IDs do not exist in the directory.
    #[error("Requested {requested} participants but only {found} exist")]
    MemberCountMismatch {
        /// Number of participant IDs in the request.
        requested: usize,
        /// Number of those IDs that resolved to members.
        found: usize,
    },

    /// Splitting the amount failed (empty participants, bad amount).
    #[error(transparent)]
    Split(#[from] SplitError),

    /// Optimistic version check failed on every retry attempt.
    #[error("Expense {0} was modified concurrently, retries exhausted")]
    VersionConflict(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<ExpenseError> for AppError {
    fn from(err: ExpenseError) -> Self {
        match err {
            ExpenseError::NotFound(_)
            | ExpenseError::GroupNotFound(_)
            | ExpenseError::PayerNotFound(_)
            | ExpenseError::GroupMismatch { .. }
            | ExpenseError::MemberCountMismatch { .. } => Self::NotFound(err.to_string()),
            ExpenseError::Split(_) => Self::Validation(err.to_string()),
            ExpenseError::VersionConflict(_) => Self::Conflict(err.to_string()),
            ExpenseError::Database(_) => Self::Database(err.to_string()),
        }
    }
}

/// Input for creating or updating an expense.
///
/// Updates replace the whole expense, shares included, so both
/// operations carry the same fields.
#[derive(Debug, Clone)]
pub struct ExpenseInput {
    /// The member who paid.
    pub payer_id: Uuid,
    /// Total amount in minor currency units. Must be positive.
    pub amount: i64,
    /// Where the money was spent.
    pub location: String,
    /// Spending category.
    pub category: ExpenseCategory,
    /// Date of the payment.
    pub spent_date: NaiveDate,
    /// Ordered, non-empty participant list. The first participant
    /// absorbs the split remainder.
    pub participant_ids: Vec<Uuid>,
}

/// Expense row with its share rows.
#[derive(Debug, Clone)]
pub struct ExpenseWithShares {
    /// Expense header.
    pub expense: expenses::Model,
    /// Share rows in participant order.
    pub shares: Vec<expense_shares::Model>,
}

/// Listing projection for one expense.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpenseSummary {
    /// Expense ID.
    pub id: Uuid,
    /// Where the money was spent.
    pub location: String,
    /// Total amount in minor currency units.
    pub amount: i64,
    /// Display name of the payer.
    pub payer_name: String,
    /// Date of the payment.
    pub spent_date: NaiveDate,
    /// Spending category.
    pub category: ExpenseCategory,
    /// Number of members sharing the expense.
    pub participant_count: usize,
}

/// Expense repository for ledger operations.
#[derive(Debug, Clone)]
pub struct ExpenseRepository {
    db: DatabaseConnection,
}

impl ExpenseRepository {
    /// Creates a new expense repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates an expense with its participant shares.
    ///
    /// Validates that the group, the payer, and every participant exist
    /// before anything is written, then inserts the expense (version 1)
    /// and its shares in one transaction. Returns the new expense ID.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails or a database operation
    /// fails.
    pub async fn create_expense(
        &self,
        group_id: Uuid,
        input: ExpenseInput,
    ) -> Result<Uuid, ExpenseError> {
        groups::Entity::find_by_id(group_id)
            .one(&self.db)
            .await?
            .ok_or(ExpenseError::GroupNotFound(group_id))?;

        let shares = self.validate_and_split(&input).await?;

        let now = Utc::now().into();
        let expense_id = Uuid::now_v7();

        let txn = self.db.begin().await?;

        expenses::ActiveModel {
            id: Set(expense_id),
            group_id: Set(group_id),
            payer_id: Set(input.payer_id),
            amount: Set(input.amount),
            location: Set(input.location.clone()),
            category: Set(input.category.clone()),
            spent_date: Set(input.spent_date),
            version: Set(1),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        insert_shares(&txn, expense_id, &shares).await?;

        txn.commit().await?;

        info!(
            expense_id = %expense_id,
            group_id = %group_id,
            amount = input.amount,
            "Expense created"
        );

        Ok(expense_id)
    }

    /// Gets an expense with its shares, addressed through a group.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the expense does not exist and
    /// `GroupMismatch` if it belongs to another group.
    pub async fn get_expense(
        &self,
        group_id: Uuid,
        expense_id: Uuid,
    ) -> Result<ExpenseWithShares, ExpenseError> {
        let expense = self.find_in_group(group_id, expense_id).await?;

        // Share IDs are UUID v7, so ID order is insertion (participant)
        // order.
        let shares = expense_shares::Entity::find()
            .filter(expense_shares::Column::ExpenseId.eq(expense_id))
            .order_by_asc(expense_shares::Column::Id)
            .all(&self.db)
            .await?;

        Ok(ExpenseWithShares { expense, shares })
    }

    /// Lists a group's expenses, most recent spend date first, ties
    /// broken by creation time descending.
    ///
    /// # Errors
    ///
    /// Returns an error if a database query fails.
    pub async fn list_expenses(&self, group_id: Uuid) -> Result<Vec<ExpenseSummary>, ExpenseError> {
        let rows = expenses::Entity::find()
            .filter(expenses::Column::GroupId.eq(group_id))
            .order_by_desc(expenses::Column::SpentDate)
            .order_by_desc(expenses::Column::CreatedAt)
            .all(&self.db)
            .await?;

        if rows.is_empty() {
            return Ok(Vec::new());
        }

        // Resolve payer names and share counts in two batch queries
        // instead of one pair per expense.
        let payer_ids: Vec<Uuid> = rows.iter().map(|e| e.payer_id).collect();
        let payers: HashMap<Uuid, String> = members::Entity::find()
            .filter(members::Column::Id.is_in(payer_ids))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|m| (m.id, m.name))
            .collect();

        let expense_ids: Vec<Uuid> = rows.iter().map(|e| e.id).collect();
        let mut share_counts: HashMap<Uuid, usize> = HashMap::new();
        let shares = expense_shares::Entity::find()
            .filter(expense_shares::Column::ExpenseId.is_in(expense_ids))
            .all(&self.db)
            .await?;
        for share in shares {
            *share_counts.entry(share.expense_id).or_insert(0) += 1;
        }

        let summaries = rows
            .into_iter()
            .map(|expense| ExpenseSummary {
                id: expense.id,
                location: expense.location,
                amount: expense.amount,
                payer_name: payers.get(&expense.payer_id).cloned().unwrap_or_default(),
                spent_date: expense.spent_date,
                category: expense.category,
                participant_count: share_counts.get(&expense.id).copied().unwrap_or(0),
            })
            .collect();

        Ok(summaries)
    }

    /// Updates an expense, replacing its share list wholesale.
    ///
    /// The commit carries an optimistic precondition: the stored
    /// `version` must still equal the version that was read. On a
    /// conflict the whole read-validate-commit cycle is retried, up to
    /// 3 attempts total with a fixed 1000 ms delay in between; only
    /// after the last attempt does `VersionConflict` surface. Each
    /// successful commit increments `version` by exactly one.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails, retries are exhausted, or
    /// a database operation fails.
    pub async fn update_expense(
        &self,
        group_id: Uuid,
        expense_id: Uuid,
        input: ExpenseInput,
    ) -> Result<(), ExpenseError> {
        let mut attempt = 1;

        loop {
            match self.try_update(group_id, expense_id, &input).await {
                Err(ExpenseError::VersionConflict(id)) if attempt < UPDATE_ATTEMPTS => {
                    warn!(
                        expense_id = %id,
                        attempt,
                        "Version conflict on expense update, retrying"
                    );
                    tokio::time::sleep(UPDATE_RETRY_DELAY).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
                Ok(()) => {
                    info!(expense_id = %expense_id, group_id = %group_id, "Expense updated");
                    return Ok(());
                }
            }
        }
    }

    /// One read-validate-commit cycle of an update.
    async fn try_update(
        &self,
        group_id: Uuid,
        expense_id: Uuid,
        input: &ExpenseInput,
    ) -> Result<(), ExpenseError> {
        let current = self.find_in_group(group_id, expense_id).await?;
        let read_version = current.version;

        let shares = self.validate_and_split(input).await?;

        let txn = self.db.begin().await?;

        // Replace children first: the old share list is deleted in the
        // same transaction that commits the new parent state, so a
        // conflict rollback leaves the previous shares untouched.
        expense_shares::Entity::delete_many()
            .filter(expense_shares::Column::ExpenseId.eq(expense_id))
            .exec(&txn)
            .await?;

        let result = expenses::Entity::update_many()
            .col_expr(
                expenses::Column::PayerId,
                sea_orm::sea_query::Expr::value(input.payer_id),
            )
            .col_expr(
                expenses::Column::Amount,
                sea_orm::sea_query::Expr::value(input.amount),
            )
            .col_expr(
                expenses::Column::Location,
                sea_orm::sea_query::Expr::value(input.location.clone()),
            )
            .col_expr(expenses::Column::Category, input.category.as_enum())
            .col_expr(
                expenses::Column::SpentDate,
                sea_orm::sea_query::Expr::value(input.spent_date),
            )
            .col_expr(
                expenses::Column::Version,
                sea_orm::sea_query::Expr::value(read_version + 1),
            )
            .col_expr(
                expenses::Column::UpdatedAt,
                sea_orm::sea_query::Expr::value(Utc::now()),
            )
            .filter(expenses::Column::Id.eq(expense_id))
            .filter(expenses::Column::Version.eq(read_version))
            .exec(&txn)
            .await?;

        if result.rows_affected == 0 {
            // Someone committed between our read and this statement.
            // Dropping the transaction rolls the share delete back.
            return Err(ExpenseError::VersionConflict(expense_id));
        }

        insert_shares(&txn, expense_id, &shares).await?;

        txn.commit().await?;
        Ok(())
    }

    /// Deletes an expense and its shares.
    ///
    /// The shares are deleted explicitly before the parent row, inside
    /// one transaction.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`/`GroupMismatch` per addressing rules, or a
    /// database error.
    pub async fn delete_expense(
        &self,
        group_id: Uuid,
        expense_id: Uuid,
    ) -> Result<(), ExpenseError> {
        self.find_in_group(group_id, expense_id).await?;

        let txn = self.db.begin().await?;

        expense_shares::Entity::delete_many()
            .filter(expense_shares::Column::ExpenseId.eq(expense_id))
            .exec(&txn)
            .await?;

        expenses::Entity::delete_by_id(expense_id).exec(&txn).await?;

        txn.commit().await?;

        info!(expense_id = %expense_id, group_id = %group_id, "Expense deleted");
        Ok(())
    }

    /// Loads an expense and enforces group addressing.
    async fn find_in_group(
        &self,
        group_id: Uuid,
        expense_id: Uuid,
    ) -> Result<expenses::Model, ExpenseError> {
        let expense = expenses::Entity::find_by_id(expense_id)
            .one(&self.db)
            .await?
            .ok_or(ExpenseError::NotFound(expense_id))?;

        if expense.group_id != group_id {
            warn!(
                expense_id = %expense_id,
                requested_group = %group_id,
                "Expense addressed through the wrong group"
            );
            return Err(ExpenseError::GroupMismatch {
                expense_id,
                group_id,
            });
        }

        Ok(expense)
    }

    /// Validates payer and participants, then computes the share list.
    ///
    /// Runs entirely before any write so failed validation never leaves
    /// partial state.
    async fn validate_and_split(
        &self,
        input: &ExpenseInput,
    ) -> Result<Vec<split::Share>, ExpenseError> {
        members::Entity::find_by_id(input.payer_id)
            .one(&self.db)
            .await?
            .ok_or(ExpenseError::PayerNotFound(input.payer_id))?;

        if input.participant_ids.is_empty() {
            warn!("Expense rejected: empty participant list");
            return Err(SplitError::EmptyParticipants.into());
        }

        let found = members::Entity::find()
            .filter(members::Column::Id.is_in(input.participant_ids.iter().copied()))
            .count(&self.db)
            .await?;
        let found = usize::try_from(found).unwrap_or(usize::MAX);

        let requested = input.participant_ids.len();
        if found < requested {
            warn!(
                requested,
                found,
                "Expense rejected: some participants do not exist"
            );
            return Err(ExpenseError::MemberCountMismatch { requested, found });
        }

        let participants: Vec<MemberId> = input
            .participant_ids
            .iter()
            .map(|&id| MemberId::from_uuid(id))
            .collect();

        Ok(split::divide(input.amount, &participants)?)
    }
}

/// Inserts the computed shares for an expense.
async fn insert_shares(
    txn: &sea_orm::DatabaseTransaction,
    expense_id: Uuid,
    shares: &[split::Share],
) -> Result<(), DbErr> {
    let models: Vec<expense_shares::ActiveModel> = shares
        .iter()
        .map(|share| expense_shares::ActiveModel {
            id: Set(Uuid::now_v7()),
            expense_id: Set(expense_id),
            member_id: Set(share.member_id.into_inner()),
            amount: Set(share.amount),
        })
        .collect();

    expense_shares::Entity::insert_many(models).exec(txn).await?;
    Ok(())
}
