//! Property-based tests for the settlement engine.

use proptest::prelude::*;

use divvy_shared::types::MemberId;

use super::service::calculate;
use super::types::{ExpenseSnapshot, ShareSnapshot};
use crate::split;

/// A generated group: member ids plus expenses built from valid splits.
fn group_with_expenses() -> impl Strategy<Value = (Vec<MemberId>, Vec<ExpenseSnapshot>)> {
    (2usize..12)
        .prop_flat_map(|member_count| {
            let members: Vec<MemberId> = (0..member_count).map(|_| MemberId::new()).collect();
            let expense = (
                0..member_count,
                1i64..10_000_000i64,
                proptest::collection::vec(0..member_count, 1..=member_count),
            );
            (
                Just(members),
                proptest::collection::vec(expense, 0..20),
            )
        })
        .prop_map(|(members, raw_expenses)| {
            let expenses = raw_expenses
                .into_iter()
                .map(|(payer_idx, total, participant_idxs)| {
                    let participants: Vec<MemberId> =
                        participant_idxs.iter().map(|&i| members[i]).collect();
                    let shares = split::divide(total, &participants)
                        .unwrap()
                        .into_iter()
                        .map(|s| ShareSnapshot {
                            member_id: s.member_id,
                            amount: s.amount,
                        })
                        .collect();

                    ExpenseSnapshot {
                        payer_id: members[payer_idx],
                        total_amount: total,
                        shares,
                    }
                })
                .collect();

            (members, expenses)
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Balances always sum to zero: every total is credited to exactly
    /// one payer and debited through shares that sum to it.
    #[test]
    fn prop_balances_sum_to_zero((members, expenses) in group_with_expenses()) {
        let balances = calculate(&members, &expenses);
        prop_assert_eq!(balances.values().sum::<i64>(), 0);
    }

    /// Every group member has an entry, even with no expenses at all.
    #[test]
    fn prop_all_members_present((members, expenses) in group_with_expenses()) {
        let balances = calculate(&members, &expenses);
        for member in &members {
            prop_assert!(balances.contains_key(member));
        }
    }

    /// Recomputing over the same snapshot is stable.
    #[test]
    fn prop_calculation_is_deterministic((members, expenses) in group_with_expenses()) {
        let first = calculate(&members, &expenses);
        let second = calculate(&members, &expenses);
        prop_assert_eq!(first, second);
    }
}
