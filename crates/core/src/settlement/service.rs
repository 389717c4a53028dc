//! Settlement engine: folds a group's expenses into net balances.

use std::collections::HashMap;

use divvy_shared::types::MemberId;

use super::types::ExpenseSnapshot;

/// Calculates each member's signed net balance over `expenses`.
///
/// Every member in `member_ids` starts at zero, so members with no
/// expenses still appear in the result. For each expense the payer is
/// credited the full total and every share member is debited their
/// share. Because each total is credited once and debited in shares
/// that sum to it exactly, the resulting balances sum to zero.
#[must_use]
pub fn calculate(
    member_ids: &[MemberId],
    expenses: &[ExpenseSnapshot],
) -> HashMap<MemberId, i64> {
    let mut balances: HashMap<MemberId, i64> =
        member_ids.iter().map(|&id| (id, 0)).collect();

    for expense in expenses {
        // Payer gains the right to collect the whole amount.
        *balances.entry(expense.payer_id).or_insert(0) += expense.total_amount;

        // Each participant owes their share of it.
        for share in &expense.shares {
            *balances.entry(share.member_id).or_insert(0) -= share.amount;
        }
    }

    balances
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settlement::types::ShareSnapshot;
    use crate::split;

    fn snapshot(payer: MemberId, total: i64, participants: &[MemberId]) -> ExpenseSnapshot {
        let shares = split::divide(total, participants)
            .unwrap()
            .into_iter()
            .map(|s| ShareSnapshot {
                member_id: s.member_id,
                amount: s.amount,
            })
            .collect();

        ExpenseSnapshot {
            payer_id: payer,
            total_amount: total,
            shares,
        }
    }

    #[test]
    fn test_single_expense_two_members() {
        let a = MemberId::new();
        let b = MemberId::new();

        let expenses = vec![snapshot(a, 100, &[a, b])];
        let balances = calculate(&[a, b], &expenses);

        // A paid 100, owes 50 -> +50. B owes 50 -> -50.
        assert_eq!(balances[&a], 50);
        assert_eq!(balances[&b], -50);
    }

    #[test]
    fn test_members_without_expenses_appear_as_zero() {
        let a = MemberId::new();
        let b = MemberId::new();
        let idle = MemberId::new();

        let expenses = vec![snapshot(a, 100, &[a, b])];
        let balances = calculate(&[a, b, idle], &expenses);

        assert_eq!(balances.len(), 3);
        assert_eq!(balances[&idle], 0);
    }

    #[test]
    fn test_no_expenses_all_zero() {
        let members: Vec<MemberId> = (0..4).map(|_| MemberId::new()).collect();
        let balances = calculate(&members, &[]);

        assert_eq!(balances.len(), 4);
        assert!(balances.values().all(|&b| b == 0));
    }

    #[test]
    fn test_payer_not_a_participant() {
        let a = MemberId::new();
        let b = MemberId::new();
        let c = MemberId::new();

        // A pays 90 for B and C only.
        let expenses = vec![snapshot(a, 90, &[b, c])];
        let balances = calculate(&[a, b, c], &expenses);

        assert_eq!(balances[&a], 90);
        assert_eq!(balances[&b], -45);
        assert_eq!(balances[&c], -45);
    }

    #[test]
    fn test_payer_outside_member_list_gets_an_entry() {
        let outsider = MemberId::new();
        let b = MemberId::new();
        let c = MemberId::new();

        // The engine tracks the outsider's credit; whether that entry
        // is reported is the caller's decision.
        let expenses = vec![snapshot(outsider, 90, &[b, c])];
        let balances = calculate(&[b, c], &expenses);

        assert_eq!(balances.len(), 3);
        assert_eq!(balances[&outsider], 90);
        assert_eq!(balances[&b], -45);
        assert_eq!(balances[&c], -45);
    }

    #[test]
    fn test_multiple_expenses_offset() {
        let a = MemberId::new();
        let b = MemberId::new();

        let expenses = vec![
            snapshot(a, 100, &[a, b]),
            snapshot(b, 100, &[a, b]),
        ];
        let balances = calculate(&[a, b], &expenses);

        assert_eq!(balances[&a], 0);
        assert_eq!(balances[&b], 0);
    }

    #[test]
    fn test_remainder_expense_sums_to_zero() {
        let members: Vec<MemberId> = (0..3).map(|_| MemberId::new()).collect();

        let expenses = vec![snapshot(members[0], 10_000, &members)];
        let balances = calculate(&members, &expenses);

        // 10,000 - 3,334 = 6,666 for the payer.
        assert_eq!(balances[&members[0]], 6_666);
        assert_eq!(balances[&members[1]], -3_333);
        assert_eq!(balances[&members[2]], -3_333);
        assert_eq!(balances.values().sum::<i64>(), 0);
    }
}
