//! In-memory store implementations.
//!
//! `Arc<RwLock<HashMap>>` per entity, shared between cheap clones. The
//! `update` methods implement the version check the ports demand: a write
//! carrying a stale version fails with `VersionConflict` and the caller must
//! re-read. This is the reference backend for tests and the demo CLI.

use crate::domain::business::Business;
use crate::domain::delivery::Delivery;
use crate::domain::ids::{BusinessId, DeliveryId, RiderId, UserId};
use crate::domain::ledger::LedgerEntry;
use crate::domain::ports::{
    BusinessStore, DeliveryStore, LedgerStore, RiderStore, UserStore,
};
use crate::domain::rider::{Rider, RiderStatus};
use crate::domain::user::User;
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default, Clone)]
pub struct InMemoryUserStore {
    records: Arc<RwLock<HashMap<UserId, User>>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn create(&self, user: User) -> Result<()> {
        let mut records = self.records.write().await;
        records.insert(user.id, user);
        Ok(())
    }

    async fn get(&self, id: UserId) -> Result<Option<User>> {
        let records = self.records.read().await;
        Ok(records.get(&id).cloned())
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let records = self.records.read().await;
        Ok(records.values().find(|u| u.email == email).cloned())
    }
}

#[derive(Default, Clone)]
pub struct InMemoryBusinessStore {
    records: Arc<RwLock<HashMap<BusinessId, Business>>>,
}

impl InMemoryBusinessStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BusinessStore for InMemoryBusinessStore {
    async fn create(&self, business: Business) -> Result<()> {
        let mut records = self.records.write().await;
        records.insert(business.id, business);
        Ok(())
    }

    async fn get(&self, id: BusinessId) -> Result<Option<Business>> {
        let records = self.records.read().await;
        Ok(records.get(&id).cloned())
    }

    async fn get_by_user_id(&self, user_id: UserId) -> Result<Option<Business>> {
        let records = self.records.read().await;
        Ok(records.values().find(|b| b.user_id == user_id).cloned())
    }

    async fn list(&self) -> Result<Vec<Business>> {
        let records = self.records.read().await;
        let mut all: Vec<Business> = records.values().cloned().collect();
        all.sort_by_key(|b| (b.created_at, b.id));
        Ok(all)
    }

    async fn update(&self, mut business: Business) -> Result<Business> {
        let mut records = self.records.write().await;
        let current = records
            .get_mut(&business.id)
            .ok_or(Error::NotFound("business"))?;
        if current.version != business.version {
            return Err(Error::VersionConflict);
        }
        business.version += 1;
        *current = business.clone();
        Ok(business)
    }
}

#[derive(Default, Clone)]
pub struct InMemoryRiderStore {
    records: Arc<RwLock<HashMap<RiderId, Rider>>>,
}

impl InMemoryRiderStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RiderStore for InMemoryRiderStore {
    async fn create(&self, rider: Rider) -> Result<()> {
        let mut records = self.records.write().await;
        records.insert(rider.id, rider);
        Ok(())
    }

    async fn get(&self, id: RiderId) -> Result<Option<Rider>> {
        let records = self.records.read().await;
        Ok(records.get(&id).cloned())
    }

    async fn get_by_user_id(&self, user_id: UserId) -> Result<Option<Rider>> {
        let records = self.records.read().await;
        Ok(records.values().find(|r| r.user_id == user_id).cloned())
    }

    async fn list(&self) -> Result<Vec<Rider>> {
        let records = self.records.read().await;
        let mut all: Vec<Rider> = records.values().cloned().collect();
        all.sort_by_key(|r| (r.created_at, r.id));
        Ok(all)
    }

    async fn list_available(&self) -> Result<Vec<Rider>> {
        let records = self.records.read().await;
        let mut available: Vec<Rider> = records
            .values()
            .filter(|r| r.status == RiderStatus::Available)
            .cloned()
            .collect();
        // Stable order so first-available selection is deterministic
        available.sort_by_key(|r| (r.created_at, r.id));
        Ok(available)
    }

    async fn update(&self, mut rider: Rider) -> Result<Rider> {
        let mut records = self.records.write().await;
        let current = records.get_mut(&rider.id).ok_or(Error::NotFound("rider"))?;
        if current.version != rider.version {
            return Err(Error::VersionConflict);
        }
        rider.version += 1;
        *current = rider.clone();
        Ok(rider)
    }
}

#[derive(Default, Clone)]
pub struct InMemoryDeliveryStore {
    records: Arc<RwLock<HashMap<DeliveryId, Delivery>>>,
}

impl InMemoryDeliveryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn sorted_newest_first(mut deliveries: Vec<Delivery>) -> Vec<Delivery> {
        deliveries.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        deliveries
    }
}

#[async_trait]
impl DeliveryStore for InMemoryDeliveryStore {
    async fn create(&self, delivery: Delivery) -> Result<()> {
        let mut records = self.records.write().await;
        records.insert(delivery.id, delivery);
        Ok(())
    }

    async fn get(&self, id: DeliveryId) -> Result<Option<Delivery>> {
        let records = self.records.read().await;
        Ok(records.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Delivery>> {
        let records = self.records.read().await;
        Ok(Self::sorted_newest_first(records.values().cloned().collect()))
    }

    async fn list_by_business(&self, business_id: BusinessId) -> Result<Vec<Delivery>> {
        let records = self.records.read().await;
        Ok(Self::sorted_newest_first(
            records
                .values()
                .filter(|d| d.business_id == business_id)
                .cloned()
                .collect(),
        ))
    }

    async fn list_by_rider(&self, rider_id: RiderId) -> Result<Vec<Delivery>> {
        let records = self.records.read().await;
        Ok(Self::sorted_newest_first(
            records
                .values()
                .filter(|d| d.rider_id == Some(rider_id))
                .cloned()
                .collect(),
        ))
    }

    async fn list_active(&self) -> Result<Vec<Delivery>> {
        let records = self.records.read().await;
        Ok(Self::sorted_newest_first(
            records.values().filter(|d| d.is_active()).cloned().collect(),
        ))
    }

    async fn list_active_by_rider(&self, rider_id: RiderId) -> Result<Vec<Delivery>> {
        let records = self.records.read().await;
        Ok(Self::sorted_newest_first(
            records
                .values()
                .filter(|d| d.is_active() && d.rider_id == Some(rider_id))
                .cloned()
                .collect(),
        ))
    }

    async fn update(&self, mut delivery: Delivery) -> Result<Delivery> {
        let mut records = self.records.write().await;
        let current = records
            .get_mut(&delivery.id)
            .ok_or(Error::NotFound("delivery"))?;
        if current.version != delivery.version {
            return Err(Error::VersionConflict);
        }
        delivery.version += 1;
        *current = delivery.clone();
        Ok(delivery)
    }
}

#[derive(Default, Clone)]
pub struct InMemoryLedgerStore {
    entries: Arc<RwLock<Vec<LedgerEntry>>>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn append(&self, entry: LedgerEntry) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.push(entry);
        Ok(())
    }

    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<LedgerEntry>> {
        let entries = self.entries.read().await;
        let mut matched: Vec<LedgerEntry> = entries
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::business::SubscriptionTier;
    use chrono::Utc;

    fn rider() -> Rider {
        Rider::new(UserId::generate(), "Ahmed".into(), "+212".into(), Utc::now())
    }

    #[tokio::test]
    async fn test_store_and_retrieve_rider() {
        let store = InMemoryRiderStore::new();
        let r = rider();
        store.create(r.clone()).await.unwrap();
        assert_eq!(store.get(r.id).await.unwrap().unwrap(), r);
        assert!(store.get(RiderId::generate()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_rejects_stale_version() {
        let store = InMemoryRiderStore::new();
        let r = rider();
        store.create(r.clone()).await.unwrap();

        let mut fresh = store.get(r.id).await.unwrap().unwrap();
        let mut stale = fresh.clone();

        fresh.mark_available();
        let fresh = store.update(fresh).await.unwrap();
        assert_eq!(fresh.version, 1);

        stale.mark_available();
        assert!(matches!(
            store.update(stale).await,
            Err(Error::VersionConflict)
        ));
    }

    #[tokio::test]
    async fn test_update_unknown_rider_is_not_found() {
        let store = InMemoryRiderStore::new();
        assert!(matches!(
            store.update(rider()).await,
            Err(Error::NotFound("rider"))
        ));
    }

    #[tokio::test]
    async fn test_list_available_filters_and_orders() {
        let store = InMemoryRiderStore::new();
        let now = Utc::now();
        let mut first = Rider::new(UserId::generate(), "Ahmed".into(), "+212".into(), now);
        first.mark_available();
        let mut second = Rider::new(
            UserId::generate(),
            "Youssef".into(),
            "+212".into(),
            now + chrono::Duration::seconds(1),
        );
        second.mark_available();
        let offline = rider();

        store.create(second.clone()).await.unwrap();
        store.create(first.clone()).await.unwrap();
        store.create(offline).await.unwrap();

        let available = store.list_available().await.unwrap();
        assert_eq!(available.len(), 2);
        assert_eq!(available[0].name, "Ahmed");
        assert_eq!(available[1].name, "Youssef");
    }

    #[tokio::test]
    async fn test_business_get_by_user_id() {
        let store = InMemoryBusinessStore::new();
        let user_id = UserId::generate();
        let b = Business::new(
            user_id,
            "Pharmacie Centrale".into(),
            SubscriptionTier::Monthly,
            Utc::now(),
        );
        store.create(b.clone()).await.unwrap();
        assert_eq!(store.get_by_user_id(user_id).await.unwrap().unwrap().id, b.id);
        assert!(store
            .get_by_user_id(UserId::generate())
            .await
            .unwrap()
            .is_none());
    }
}
