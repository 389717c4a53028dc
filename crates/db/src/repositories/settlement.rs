//! Settlement repository: balance previews and the persisted
//! settlement lifecycle.
//!
//! Previewing is pure computation over the ledger and writes nothing.
//! Completing upserts one row per group member under the
//! `(group_id, member_id)` unique key; cancelling only zeroes rows that
//! already exist and never creates any.

use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use tracing::info;
use uuid::Uuid;

use divvy_core::settlement::{self, BalanceView, ExpenseSnapshot, ShareSnapshot};
use divvy_shared::types::MemberId;
use divvy_shared::AppError;

use crate::entities::{expense_shares, expenses, group_members, groups, members, settlements};
use crate::repositories::member::MemberIdentity;

/// Error types for settlement operations.
#[derive(Debug, thiserror::Error)]
pub enum SettlementStoreError {
    /// Group not found.
    #[error("Group not found: {0}")]
    GroupNotFound(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<SettlementStoreError> for AppError {
    fn from(err: SettlementStoreError) -> Self {
        match err {
            SettlementStoreError::GroupNotFound(_) => Self::NotFound(err.to_string()),
            SettlementStoreError::Database(_) => Self::Database(err.to_string()),
        }
    }
}

/// A group member's computed balance, ready for presentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberBalance {
    /// The member the balance belongs to.
    pub member: MemberIdentity,
    /// Net, send, and receive amounts.
    pub balance: BalanceView,
}

/// A persisted settlement row joined with its member identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementRow {
    /// The member the row belongs to.
    pub member: MemberIdentity,
    /// Signed net amount frozen at completion time.
    pub net_amount: i64,
    /// Whether the row is in the settled state.
    pub is_settled: bool,
    /// Completion timestamp, present exactly when settled.
    pub settled_at: Option<chrono::DateTime<chrono::FixedOffset>>,
}

/// Settlement repository.
#[derive(Debug, Clone)]
pub struct SettlementRepository {
    db: DatabaseConnection,
}

impl SettlementRepository {
    /// Creates a new settlement repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Computes the current balances of a group without persisting
    /// anything.
    ///
    /// An unknown or empty group yields an empty list rather than an
    /// error; only the stateful operations insist on group existence.
    ///
    /// # Errors
    ///
    /// Returns an error if a database query fails.
    pub async fn preview_settlement(
        &self,
        group_id: Uuid,
    ) -> Result<Vec<MemberBalance>, SettlementStoreError> {
        let identities = self.group_member_identities(group_id).await?;
        let balances = self.compute_balances(group_id, &identities).await?;

        Ok(identities
            .into_iter()
            .map(|member| {
                let net = balances
                    .get(&MemberId::from_uuid(member.id))
                    .copied()
                    .unwrap_or(0);
                MemberBalance {
                    member,
                    balance: BalanceView::from_net(net),
                }
            })
            .collect())
    }

    /// Freezes the group's current balances into settlement rows.
    ///
    /// For each member the row under `(group_id, member_id)` is updated
    /// in place if it exists and inserted otherwise, with the frozen
    /// net amount, `is_settled = true`, and a shared completion
    /// timestamp. All rows commit in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `GroupNotFound` for an unknown group, or a database
    /// error.
    pub async fn complete_settlement(
        &self,
        group_id: Uuid,
    ) -> Result<Vec<SettlementRow>, SettlementStoreError> {
        groups::Entity::find_by_id(group_id)
            .one(&self.db)
            .await?
            .ok_or(SettlementStoreError::GroupNotFound(group_id))?;

        let identities = self.group_member_identities(group_id).await?;
        let balances = self.compute_balances(group_id, &identities).await?;

        let now = Utc::now().into();
        let txn = self.db.begin().await?;

        let mut rows = Vec::with_capacity(identities.len());
        for member in identities {
            let net = balances
                .get(&MemberId::from_uuid(member.id))
                .copied()
                .unwrap_or(0);

            let existing = settlements::Entity::find()
                .filter(settlements::Column::GroupId.eq(group_id))
                .filter(settlements::Column::MemberId.eq(member.id))
                .one(&txn)
                .await?;

            match existing {
                Some(model) => {
                    let mut active: settlements::ActiveModel = model.into();
                    active.net_amount = Set(net);
                    active.is_settled = Set(true);
                    active.settled_at = Set(Some(now));
                    active.updated_at = Set(now);
                    active.update(&txn).await?;
                }
                None => {
                    settlements::ActiveModel {
                        id: Set(Uuid::now_v7()),
                        group_id: Set(group_id),
                        member_id: Set(member.id),
                        net_amount: Set(net),
                        is_settled: Set(true),
                        settled_at: Set(Some(now)),
                        created_at: Set(now),
                        updated_at: Set(now),
                    }
                    .insert(&txn)
                    .await?;
                }
            }

            rows.push(SettlementRow {
                member,
                net_amount: net,
                is_settled: true,
                settled_at: Some(now),
            });
        }

        txn.commit().await?;

        info!(group_id = %group_id, members = rows.len(), "Settlement completed");
        Ok(rows)
    }

    /// Reverts a completed settlement by zeroing the group's existing
    /// rows.
    ///
    /// Only rows that already exist are touched; cancelling never
    /// creates one. Returns the number of rows zeroed, which is 0 when
    /// the group was never completed (or does not exist).
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn cancel_settlement(&self, group_id: Uuid) -> Result<u64, SettlementStoreError> {
        let result = settlements::Entity::update_many()
            .col_expr(
                settlements::Column::NetAmount,
                sea_orm::sea_query::Expr::value(0_i64),
            )
            .col_expr(
                settlements::Column::IsSettled,
                sea_orm::sea_query::Expr::value(false),
            )
            .col_expr(
                settlements::Column::SettledAt,
                sea_orm::sea_query::Expr::value(Option::<chrono::DateTime<chrono::FixedOffset>>::None),
            )
            .col_expr(
                settlements::Column::UpdatedAt,
                sea_orm::sea_query::Expr::value(Utc::now()),
            )
            .filter(settlements::Column::GroupId.eq(group_id))
            .exec(&self.db)
            .await?;

        info!(
            group_id = %group_id,
            rows = result.rows_affected,
            "Settlement cancelled"
        );
        Ok(result.rows_affected)
    }

    /// Lists the group's persisted settlement rows with member
    /// identities.
    ///
    /// # Errors
    ///
    /// Returns an error if a database query fails.
    pub async fn list_settlements(
        &self,
        group_id: Uuid,
    ) -> Result<Vec<SettlementRow>, SettlementStoreError> {
        let rows = settlements::Entity::find()
            .filter(settlements::Column::GroupId.eq(group_id))
            .all(&self.db)
            .await?;

        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let member_ids: Vec<Uuid> = rows.iter().map(|r| r.member_id).collect();
        let identities: HashMap<Uuid, MemberIdentity> = members::Entity::find()
            .filter(members::Column::Id.is_in(member_ids))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|m| (m.id, MemberIdentity::from(m)))
            .collect();

        Ok(rows
            .into_iter()
            .filter_map(|row| {
                identities.get(&row.member_id).cloned().map(|member| SettlementRow {
                    member,
                    net_amount: row.net_amount,
                    is_settled: row.is_settled,
                    settled_at: row.settled_at,
                })
            })
            .collect())
    }

    /// Loads the group's members with display identities.
    async fn group_member_identities(
        &self,
        group_id: Uuid,
    ) -> Result<Vec<MemberIdentity>, DbErr> {
        let memberships = group_members::Entity::find()
            .filter(group_members::Column::GroupId.eq(group_id))
            .all(&self.db)
            .await?;

        if memberships.is_empty() {
            return Ok(Vec::new());
        }

        let member_ids: Vec<Uuid> = memberships.iter().map(|m| m.member_id).collect();
        let mut identities: HashMap<Uuid, MemberIdentity> = members::Entity::find()
            .filter(members::Column::Id.is_in(member_ids.iter().copied()))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|m| (m.id, MemberIdentity::from(m)))
            .collect();

        // Preserve membership order.
        Ok(member_ids
            .into_iter()
            .filter_map(|id| identities.remove(&id))
            .collect())
    }

    /// Runs the balance engine over the group's full ledger.
    ///
    /// The returned map can hold an entry for a payer recorded outside
    /// the current membership. Preview and complete report membership
    /// rows only, so such an entry still shifts the other balances but
    /// never becomes a row of its own.
    async fn compute_balances(
        &self,
        group_id: Uuid,
        identities: &[MemberIdentity],
    ) -> Result<HashMap<MemberId, i64>, DbErr> {
        let member_ids: Vec<MemberId> = identities
            .iter()
            .map(|m| MemberId::from_uuid(m.id))
            .collect();

        let snapshots = self.load_snapshots(group_id).await?;
        Ok(settlement::calculate(&member_ids, &snapshots))
    }

    /// Loads every expense of the group with its shares, in the shape
    /// the balance engine consumes.
    async fn load_snapshots(&self, group_id: Uuid) -> Result<Vec<ExpenseSnapshot>, DbErr> {
        let expense_rows = expenses::Entity::find()
            .filter(expenses::Column::GroupId.eq(group_id))
            .all(&self.db)
            .await?;

        if expense_rows.is_empty() {
            return Ok(Vec::new());
        }

        let expense_ids: Vec<Uuid> = expense_rows.iter().map(|e| e.id).collect();
        let mut shares_by_expense: HashMap<Uuid, Vec<ShareSnapshot>> = HashMap::new();
        let share_rows = expense_shares::Entity::find()
            .filter(expense_shares::Column::ExpenseId.is_in(expense_ids))
            .all(&self.db)
            .await?;
        for share in share_rows {
            shares_by_expense
                .entry(share.expense_id)
                .or_default()
                .push(ShareSnapshot {
                    member_id: MemberId::from_uuid(share.member_id),
                    amount: share.amount,
                });
        }

        Ok(expense_rows
            .into_iter()
            .map(|expense| ExpenseSnapshot {
                payer_id: MemberId::from_uuid(expense.payer_id),
                total_amount: expense.amount,
                shares: shares_by_expense.remove(&expense.id).unwrap_or_default(),
            })
            .collect())
    }
}
