//! Types consumed and produced by the settlement engine.

use divvy_shared::types::MemberId;
use serde::{Deserialize, Serialize};

/// The slice of an expense the settlement engine needs: who paid, how
/// much, and how the total was shared out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpenseSnapshot {
    /// The member who paid the whole amount up front.
    pub payer_id: MemberId,
    /// Total amount paid, in minor currency units.
    pub total_amount: i64,
    /// The per-participant shares of `total_amount`.
    pub shares: Vec<ShareSnapshot>,
}

/// One member's share of an expense total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShareSnapshot {
    /// The member who owes this share.
    pub member_id: MemberId,
    /// Owed amount in minor currency units.
    pub amount: i64,
}

/// Presentation mapping of a signed net balance.
///
/// A positive net balance is money the member should receive; a negative
/// one, sign stripped, is money the member should send. This is purely a
/// downstream view; the signed `net` carries the invariant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceView {
    /// Signed net balance (positive = owed money, negative = owes money).
    pub net: i64,
    /// Amount to send (sign-stripped negative net, else 0).
    pub send: i64,
    /// Amount to receive (positive net, else 0).
    pub receive: i64,
}

impl BalanceView {
    /// Builds the view for a signed net balance.
    #[must_use]
    pub const fn from_net(net: i64) -> Self {
        let (send, receive) = if net > 0 {
            (0, net)
        } else if net < 0 {
            (net.abs(), 0)
        } else {
            (0, 0)
        };

        Self { net, send, receive }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_net_is_receivable() {
        let view = BalanceView::from_net(5_000);
        assert_eq!(view.net, 5_000);
        assert_eq!(view.send, 0);
        assert_eq!(view.receive, 5_000);
    }

    #[test]
    fn test_negative_net_is_sendable_with_sign_stripped() {
        let view = BalanceView::from_net(-3_200);
        assert_eq!(view.net, -3_200);
        assert_eq!(view.send, 3_200);
        assert_eq!(view.receive, 0);
    }

    #[test]
    fn test_zero_net_reports_both_zero() {
        let view = BalanceView::from_net(0);
        assert_eq!(view.send, 0);
        assert_eq!(view.receive, 0);
    }
}
