//! Tariff tables: rider commission tiers, delivery pricing and subscription
//! terms. Pure functions, no side effects.

use super::business::SubscriptionTier;
use super::delivery::PaymentMethod;
use super::money::Money;

/// Per-delivery commission for a rider, by lifetime delivery count.
///
/// Boundary values belong to the higher tier: exactly 31 deliveries already
/// pays 15 MAD.
pub fn commission_rate(total_deliveries: u32) -> Money {
    let mad = if total_deliveries >= 200 {
        17
    } else if total_deliveries >= 71 {
        16
    } else if total_deliveries >= 31 {
        15
    } else {
        14
    };
    Money::from_mad(mad)
}

/// Price of a delivery by estimated duration and payment method.
///
/// Billed in 30-minute increments, rounded up: a 1-minute delivery costs a
/// full increment. Subscription-covered deliveries are free at point of use.
pub fn delivery_price(duration_minutes: u32, method: PaymentMethod) -> Money {
    let rate_per_half_hour = match method {
        PaymentMethod::Subscription => return Money::ZERO,
        PaymentMethod::Wallet => 18,
        PaymentMethod::Pack => 20,
        PaymentMethod::Payg => 25,
    };
    Money::from_mad(duration_minutes.div_ceil(30) * rate_per_half_hour)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionTerms {
    pub price: Money,
    pub rides: u32,
    pub duration_days: u32,
}

/// Quota and billing terms per subscription tier.
///
/// Kept as the single source for ride allocation wherever a quota is set up.
pub fn subscription_terms(tier: SubscriptionTier) -> SubscriptionTerms {
    match tier {
        SubscriptionTier::Monthly => SubscriptionTerms {
            price: Money::from_mad(200),
            rides: 8,
            duration_days: 30,
        },
        SubscriptionTier::Annual => SubscriptionTerms {
            price: Money::from_mad(1800),
            rides: 96,
            duration_days: 365,
        },
        SubscriptionTier::None => SubscriptionTerms {
            price: Money::ZERO,
            rides: 0,
            duration_days: 0,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commission_tier_boundaries() {
        assert_eq!(commission_rate(0), Money::from_mad(14));
        assert_eq!(commission_rate(30), Money::from_mad(14));
        assert_eq!(commission_rate(31), Money::from_mad(15));
        assert_eq!(commission_rate(70), Money::from_mad(15));
        assert_eq!(commission_rate(71), Money::from_mad(16));
        assert_eq!(commission_rate(199), Money::from_mad(16));
        assert_eq!(commission_rate(200), Money::from_mad(17));
        assert_eq!(commission_rate(u32::MAX), Money::from_mad(17));
    }

    #[test]
    fn test_price_rounds_up_to_half_hour() {
        assert_eq!(
            delivery_price(1, PaymentMethod::Wallet),
            Money::from_mad(18)
        );
        assert_eq!(
            delivery_price(30, PaymentMethod::Wallet),
            Money::from_mad(18)
        );
        assert_eq!(
            delivery_price(31, PaymentMethod::Wallet),
            Money::from_mad(36)
        );
        assert_eq!(delivery_price(60, PaymentMethod::Pack), Money::from_mad(40));
        assert_eq!(delivery_price(45, PaymentMethod::Payg), Money::from_mad(50));
    }

    #[test]
    fn test_subscription_is_free_at_point_of_use() {
        assert_eq!(delivery_price(240, PaymentMethod::Subscription), Money::ZERO);
    }

    #[test]
    fn test_zero_duration_costs_nothing() {
        assert_eq!(delivery_price(0, PaymentMethod::Wallet), Money::ZERO);
    }

    #[test]
    fn test_subscription_terms_table() {
        let monthly = subscription_terms(SubscriptionTier::Monthly);
        assert_eq!(monthly.price, Money::from_mad(200));
        assert_eq!(monthly.rides, 8);
        assert_eq!(monthly.duration_days, 30);

        let annual = subscription_terms(SubscriptionTier::Annual);
        assert_eq!(annual.price, Money::from_mad(1800));
        assert_eq!(annual.rides, 96);
        assert_eq!(annual.duration_days, 365);

        let none = subscription_terms(SubscriptionTier::None);
        assert_eq!(none.price, Money::ZERO);
        assert_eq!(none.rides, 0);
    }
}
