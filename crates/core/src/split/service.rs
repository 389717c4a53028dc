//! Split engine: turns a total amount and an ordered participant list
//! into per-participant shares.

use divvy_shared::types::MemberId;

use super::error::SplitError;
use super::types::Share;

/// Divides `total_amount` equally among `participants`.
///
/// Each participant receives `total_amount / n` (floor). The integer
/// remainder `total_amount % n` goes to the FIRST participant in the
/// given order, so the shares always sum to the total exactly.
/// Example: 10,000 over three people -> 3,334 / 3,333 / 3,333.
///
/// The remainder bias follows caller-supplied order. It is a simple
/// deterministic tie-break, not a fairness rotation; callers that care
/// about who absorbs the extra unit control it by ordering the list.
///
/// Pure function: identical inputs always produce identical output.
///
/// # Errors
///
/// Returns [`SplitError::EmptyParticipants`] if `participants` is empty
/// and [`SplitError::NonPositiveAmount`] if `total_amount <= 0`.
pub fn divide(total_amount: i64, participants: &[MemberId]) -> Result<Vec<Share>, SplitError> {
    if participants.is_empty() {
        return Err(SplitError::EmptyParticipants);
    }
    if total_amount <= 0 {
        return Err(SplitError::NonPositiveAmount(total_amount));
    }

    #[allow(clippy::cast_possible_wrap)]
    let count = participants.len() as i64;
    let base = total_amount / count;
    let remainder = total_amount % count;

    let shares = participants
        .iter()
        .enumerate()
        .map(|(i, &member_id)| Share {
            member_id,
            amount: if i == 0 { base + remainder } else { base },
        })
        .collect();

    Ok(shares)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn members(n: usize) -> Vec<MemberId> {
        (0..n).map(|_| MemberId::new()).collect()
    }

    #[test]
    fn test_divide_exact() {
        let participants = members(4);
        let shares = divide(10_000, &participants).unwrap();

        assert_eq!(shares.len(), 4);
        assert!(shares.iter().all(|s| s.amount == 2_500));
    }

    #[test]
    fn test_divide_remainder_goes_to_first() {
        let participants = members(3);
        let shares = divide(10_000, &participants).unwrap();

        assert_eq!(shares[0].amount, 3_334);
        assert_eq!(shares[1].amount, 3_333);
        assert_eq!(shares[2].amount, 3_333);
    }

    #[test]
    fn test_divide_single_participant_takes_all() {
        let participants = members(1);
        let shares = divide(7_777, &participants).unwrap();

        assert_eq!(shares.len(), 1);
        assert_eq!(shares[0].amount, 7_777);
        assert_eq!(shares[0].member_id, participants[0]);
    }

    #[test]
    fn test_divide_preserves_participant_order() {
        let participants = members(5);
        let shares = divide(999, &participants).unwrap();

        let order: Vec<MemberId> = shares.iter().map(|s| s.member_id).collect();
        assert_eq!(order, participants);
    }

    #[test]
    fn test_divide_amount_smaller_than_count() {
        // 2 units over 3 people: floor share is 0, first absorbs both.
        let participants = members(3);
        let shares = divide(2, &participants).unwrap();

        assert_eq!(shares[0].amount, 2);
        assert_eq!(shares[1].amount, 0);
        assert_eq!(shares[2].amount, 0);
    }

    #[test]
    fn test_divide_empty_participants() {
        assert_eq!(divide(10_000, &[]), Err(SplitError::EmptyParticipants));
    }

    #[rstest]
    #[case(0)]
    #[case(-1)]
    #[case(-10_000)]
    fn test_divide_non_positive_amount(#[case] amount: i64) {
        let participants = members(2);
        assert_eq!(
            divide(amount, &participants),
            Err(SplitError::NonPositiveAmount(amount))
        );
    }

    #[test]
    fn test_divide_is_deterministic() {
        let participants = members(7);
        let first = divide(123_457, &participants).unwrap();
        let second = divide(123_457, &participants).unwrap();
        assert_eq!(first, second);
    }
}
