//! Types produced by the split engine.

use divvy_shared::types::MemberId;
use serde::{Deserialize, Serialize};

/// One participant's portion of an expense total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Share {
    /// The member who owes this portion.
    pub member_id: MemberId,
    /// Owed amount in minor currency units. Never negative.
    pub amount: i64,
}
