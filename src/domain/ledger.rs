use super::ids::{LedgerEntryId, UserId};
use super::money::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerEntryKind {
    Subscription,
    TopUp,
    Commission,
    Payout,
    DeliveryCharge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerEntryStatus {
    Pending,
    Completed,
    Failed,
}

/// Append-only audit record. The engine only ever writes these; no dispatch
/// decision reads them back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: LedgerEntryId,
    pub user_id: UserId,
    pub kind: LedgerEntryKind,
    pub amount: Money,
    pub payment_method: String,
    pub status: LedgerEntryStatus,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    pub fn new(
        user_id: UserId,
        kind: LedgerEntryKind,
        amount: Money,
        payment_method: impl Into<String>,
        description: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: LedgerEntryId::generate(),
            user_id,
            kind,
            amount,
            payment_method: payment_method.into(),
            status: LedgerEntryStatus::Completed,
            description: description.into(),
            created_at: now,
        }
    }
}
