//! Property-based tests for the split engine.

#![allow(clippy::cast_possible_wrap)]

use proptest::prelude::*;

use divvy_shared::types::MemberId;

use super::service::divide;

/// Strategy to generate a positive amount in minor units.
fn positive_amount() -> impl Strategy<Value = i64> {
    1i64..1_000_000_000i64
}

/// Strategy to generate a non-empty participant list.
fn participant_list() -> impl Strategy<Value = Vec<MemberId>> {
    (1usize..50).prop_map(|n| (0..n).map(|_| MemberId::new()).collect())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Shares always sum exactly to the total, for any amount and any
    /// participant count.
    #[test]
    fn prop_shares_sum_to_total(
        total in positive_amount(),
        participants in participant_list(),
    ) {
        let shares = divide(total, &participants).unwrap();

        let sum: i64 = shares.iter().map(|s| s.amount).sum();
        prop_assert_eq!(sum, total);
        prop_assert_eq!(shares.len(), participants.len());
    }

    /// The first share is `floor + remainder`, every other share is the
    /// floor division result.
    #[test]
    fn prop_remainder_to_first(
        total in positive_amount(),
        participants in participant_list(),
    ) {
        let shares = divide(total, &participants).unwrap();

        let count = participants.len() as i64;
        let base = total / count;
        let remainder = total % count;

        prop_assert_eq!(shares[0].amount, base + remainder);
        for share in &shares[1..] {
            prop_assert_eq!(share.amount, base);
        }
    }

    /// No share is ever negative.
    #[test]
    fn prop_shares_non_negative(
        total in positive_amount(),
        participants in participant_list(),
    ) {
        let shares = divide(total, &participants).unwrap();
        prop_assert!(shares.iter().all(|s| s.amount >= 0));
    }

    /// Shares between any two participants after the first never differ;
    /// first-vs-rest differ by at most `n - 1`.
    #[test]
    fn prop_shares_almost_equal(
        total in positive_amount(),
        participants in participant_list(),
    ) {
        let shares = divide(total, &participants).unwrap();

        let max = shares.iter().map(|s| s.amount).max().unwrap();
        let min = shares.iter().map(|s| s.amount).min().unwrap();
        prop_assert!(max - min < participants.len() as i64);
    }
}
