use super::ids::{BusinessId, UserId};
use super::money::{Credit, Money};
use super::pricing;
use crate::error::{Error, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionTier {
    Monthly,
    Annual,
    None,
}

impl fmt::Display for SubscriptionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SubscriptionTier::Monthly => "monthly",
            SubscriptionTier::Annual => "annual",
            SubscriptionTier::None => "none",
        };
        f.write_str(s)
    }
}

impl FromStr for SubscriptionTier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "monthly" => Ok(SubscriptionTier::Monthly),
            "annual" => Ok(SubscriptionTier::Annual),
            "none" => Ok(SubscriptionTier::None),
            other => Err(Error::Validation(format!(
                "unknown subscription tier: {other}"
            ))),
        }
    }
}

/// A business customer: subscription quota plus pay-as-you-go wallet.
///
/// Invariant: `0 <= rides_used <= rides_total`. The `version` field backs the
/// stores' compare-and-set update; counters are never blindly overwritten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Business {
    pub id: BusinessId,
    pub user_id: UserId,
    pub name: String,
    pub subscription_tier: SubscriptionTier,
    pub rides_used: u32,
    pub rides_total: u32,
    pub wallet_balance: Money,
    pub renewal_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub version: u64,
}

impl Business {
    /// Onboards a business with the quota and renewal date of its tier.
    pub fn new(user_id: UserId, name: String, tier: SubscriptionTier, now: DateTime<Utc>) -> Self {
        let terms = pricing::subscription_terms(tier);
        let renewal_date = if tier == SubscriptionTier::None {
            None
        } else {
            Some(now + Duration::days(i64::from(terms.duration_days)))
        };
        Self {
            id: BusinessId::generate(),
            user_id,
            name,
            subscription_tier: tier,
            rides_used: 0,
            rides_total: terms.rides,
            wallet_balance: Money::ZERO,
            renewal_date,
            created_at: now,
            version: 0,
        }
    }

    pub fn subscription_covered(&self) -> bool {
        self.subscription_tier != SubscriptionTier::None
    }

    pub fn rides_remaining(&self) -> u32 {
        self.rides_total.saturating_sub(self.rides_used)
    }

    /// Claims one subscription-covered ride.
    pub fn consume_ride(&mut self) -> Result<()> {
        if self.rides_used >= self.rides_total {
            return Err(Error::QuotaExhausted);
        }
        self.rides_used += 1;
        Ok(())
    }

    /// Returns a claimed ride, compensating a failed assignment.
    pub fn release_ride(&mut self) {
        self.rides_used = self.rides_used.saturating_sub(1);
    }

    pub fn add_credits(&mut self, credit: Credit) {
        self.wallet_balance += credit.into();
    }
}
