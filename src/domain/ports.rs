//! Persistence and clock ports consumed by the dispatch engine.
//!
//! The only consistency guarantee the engine relies on is read-after-write
//! for a single caller. Mutable aggregates carry a `version`; `update` must
//! reject a write whose version no longer matches the stored record with
//! [`Error::VersionConflict`](crate::error::Error::VersionConflict), which is
//! what prevents lost updates between concurrent sessions.

use super::business::Business;
use super::delivery::Delivery;
use super::ids::{BusinessId, DeliveryId, RiderId, UserId};
use super::ledger::LedgerEntry;
use super::rider::Rider;
use super::user::User;
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create(&self, user: User) -> Result<()>;
    async fn get(&self, id: UserId) -> Result<Option<User>>;
    async fn get_by_email(&self, email: &str) -> Result<Option<User>>;
}

#[async_trait]
pub trait BusinessStore: Send + Sync {
    async fn create(&self, business: Business) -> Result<()>;
    async fn get(&self, id: BusinessId) -> Result<Option<Business>>;
    async fn get_by_user_id(&self, user_id: UserId) -> Result<Option<Business>>;
    async fn list(&self) -> Result<Vec<Business>>;
    /// Version-checked write; returns the updated record with its version
    /// bumped.
    async fn update(&self, business: Business) -> Result<Business>;
}

#[async_trait]
pub trait RiderStore: Send + Sync {
    async fn create(&self, rider: Rider) -> Result<()>;
    async fn get(&self, id: RiderId) -> Result<Option<Rider>>;
    async fn get_by_user_id(&self, user_id: UserId) -> Result<Option<Rider>>;
    async fn list(&self) -> Result<Vec<Rider>>;
    /// Riders currently in `available` status, in stable iteration order.
    async fn list_available(&self) -> Result<Vec<Rider>>;
    /// Version-checked write; returns the updated record with its version
    /// bumped.
    async fn update(&self, rider: Rider) -> Result<Rider>;
}

#[async_trait]
pub trait DeliveryStore: Send + Sync {
    async fn create(&self, delivery: Delivery) -> Result<()>;
    async fn get(&self, id: DeliveryId) -> Result<Option<Delivery>>;
    /// All lists are sorted by creation time, newest first.
    async fn list(&self) -> Result<Vec<Delivery>>;
    async fn list_by_business(&self, business_id: BusinessId) -> Result<Vec<Delivery>>;
    async fn list_by_rider(&self, rider_id: RiderId) -> Result<Vec<Delivery>>;
    async fn list_active(&self) -> Result<Vec<Delivery>>;
    async fn list_active_by_rider(&self, rider_id: RiderId) -> Result<Vec<Delivery>>;
    /// Version-checked write; returns the updated record with its version
    /// bumped.
    async fn update(&self, delivery: Delivery) -> Result<Delivery>;
}

/// Write-only sink from the engine's point of view; the list side exists for
/// portal adapters.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn append(&self, entry: LedgerEntry) -> Result<()>;
    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<LedgerEntry>>;
}

pub type UserStoreBox = Box<dyn UserStore>;
pub type BusinessStoreBox = Box<dyn BusinessStore>;
pub type RiderStoreBox = Box<dyn RiderStore>;
pub type DeliveryStoreBox = Box<dyn DeliveryStore>;
pub type LedgerStoreBox = Box<dyn LedgerStore>;

/// Source of current time, injectable for tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to. Handles are cheap clones sharing the
/// same instant, so a test can keep one and advance time mid-scenario.
#[derive(Debug, Clone)]
pub struct FixedClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl FixedClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn set(&self, instant: DateTime<Utc>) {
        *self.now.lock().expect("clock mutex poisoned") = instant;
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.lock().expect("clock mutex poisoned");
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock mutex poisoned")
    }
}
