#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use courier_dispatch::application::engine::{DispatchConfig, DispatchEngine};
use courier_dispatch::domain::business::{Business, SubscriptionTier};
use courier_dispatch::domain::delivery::{Delivery, DeliveryRequest, PaymentMethod};
use courier_dispatch::domain::ids::UserId;
use courier_dispatch::domain::money::Money;
use courier_dispatch::domain::ports::{
    BusinessStore, Clock, DeliveryStore, FixedClock, RiderStore,
};
use courier_dispatch::domain::rider::Rider;
use courier_dispatch::infrastructure::in_memory::{
    InMemoryBusinessStore, InMemoryDeliveryStore, InMemoryLedgerStore, InMemoryRiderStore,
};

/// Engine wired to in-memory stores and a controllable clock, with direct
/// store handles kept for seeding and assertions.
pub struct Harness {
    pub engine: DispatchEngine,
    pub clock: FixedClock,
    pub businesses: InMemoryBusinessStore,
    pub riders: InMemoryRiderStore,
    pub deliveries: InMemoryDeliveryStore,
    pub ledger: InMemoryLedgerStore,
}

pub fn harness() -> Harness {
    harness_with(DispatchConfig::default())
}

pub fn harness_with(config: DispatchConfig) -> Harness {
    let clock = FixedClock::new(Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap());
    let businesses = InMemoryBusinessStore::new();
    let riders = InMemoryRiderStore::new();
    let deliveries = InMemoryDeliveryStore::new();
    let ledger = InMemoryLedgerStore::new();

    let engine = DispatchEngine::new(
        Box::new(businesses.clone()),
        Box::new(riders.clone()),
        Box::new(deliveries.clone()),
        Box::new(ledger.clone()),
    )
    .with_clock(Box::new(clock.clone()))
    .with_config(config);

    Harness {
        engine,
        clock,
        businesses,
        riders,
        deliveries,
        ledger,
    }
}

impl Harness {
    pub async fn seed_business(&self, name: &str, tier: SubscriptionTier) -> Business {
        let business = Business::new(UserId::generate(), name.into(), tier, self.clock.now());
        self.businesses.create(business.clone()).await.unwrap();
        business
    }

    /// Seeds a rider. Advances the clock one second so repeated seeds keep a
    /// stable creation order for first-available selection.
    pub async fn seed_rider(&self, name: &str, online: bool) -> Rider {
        let mut rider = Rider::new(
            UserId::generate(),
            name.into(),
            "+212 6 00 00 00 00".into(),
            self.clock.now(),
        );
        if online {
            rider.mark_available();
        }
        self.riders.create(rider.clone()).await.unwrap();
        self.clock.advance(chrono::Duration::seconds(1));
        rider
    }

    /// Seeds an unassigned pending delivery, the state an assignment defeat
    /// leaves behind.
    pub async fn seed_pending_delivery(
        &self,
        business: &Business,
        method: PaymentMethod,
    ) -> Delivery {
        let price = if business.subscription_covered() {
            Money::ZERO
        } else {
            Money::from_mad(25)
        };
        let delivery = Delivery::new(
            business.id,
            request(method),
            price,
            Money::from_mad(15),
            self.clock.now(),
        );
        self.deliveries.create(delivery.clone()).await.unwrap();
        delivery
    }
}

pub fn request(method: PaymentMethod) -> DeliveryRequest {
    DeliveryRequest {
        pickup_address: "Pharmacie Centrale, Avenue Mohammed V, Tangier".into(),
        pickup_lat: 35.7650,
        pickup_lng: -5.8250,
        dropoff_address: "45 Rue de Fes, Tangier".into(),
        dropoff_lat: 35.7700,
        dropoff_lng: -5.8180,
        estimated_duration: 15,
        payment_method: method,
    }
}
