use crate::application::strategies::{FirstAvailable, RiderSelector};
use crate::domain::business::Business;
use crate::domain::delivery::{Delivery, DeliveryRequest, DeliveryStatus};
use crate::domain::ids::{BusinessId, DeliveryId, RiderId, UserId};
use crate::domain::ledger::{LedgerEntry, LedgerEntryKind};
use crate::domain::money::{Credit, Money};
use crate::domain::ports::{
    BusinessStoreBox, Clock, DeliveryStoreBox, LedgerStoreBox, RiderStoreBox, SystemClock,
};
use crate::domain::pricing;
use crate::domain::rider::{Location, Rider, RiderStatus};
use crate::error::{Error, Result};
use tracing::{debug, info, warn};

/// Flat price charged at request time for a non-covered delivery, in MAD.
const FLAT_REQUEST_PRICE_MAD: u32 = 25;
/// Flat commission recorded at request time, in MAD.
const FLAT_REQUEST_COMMISSION_MAD: u32 = 15;

/// When a rider's commission is decided.
///
/// The platform historically recorded a flat commission when the delivery was
/// requested while the rider dashboard displayed the tier-based rate; the two
/// disagree for riders past the first tier. The policy makes that choice
/// explicit instead of baking one answer in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommissionPolicy {
    /// Pay the commission stored on the delivery at request time.
    #[default]
    LockedAtRequest,
    /// Pay `commission_rate(rider.total_deliveries)` at completion.
    TieredAtCompletion,
}

#[derive(Debug, Clone, Copy)]
pub struct DispatchConfig {
    pub commission_policy: CommissionPolicy,
    /// Bound on compare-and-set retry loops, so a contended assignment fails
    /// with [`Error::AssignmentConflict`] instead of spinning.
    pub max_assignment_attempts: u32,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            commission_policy: CommissionPolicy::default(),
            max_assignment_attempts: 3,
        }
    }
}

/// The outcome of an assignment: the delivery and the rider now bound to it.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryTicket {
    pub delivery: Delivery,
    pub rider: Rider,
}

/// Read model for portal adapters: a delivery with display names joined in at
/// query time. A name is `None` when its referent no longer exists.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct DeliveryView {
    #[serde(flatten)]
    pub delivery: Delivery,
    pub business_name: Option<String>,
    pub rider_name: Option<String>,
}

/// The delivery dispatch and lifecycle engine.
///
/// Owns the store ports and performs every shared-counter mutation as a
/// version-checked update, retried against fresh state when another session
/// wins the race. Callers pass explicit ids; the engine never reads ambient
/// session state.
pub struct DispatchEngine {
    businesses: BusinessStoreBox,
    riders: RiderStoreBox,
    deliveries: DeliveryStoreBox,
    ledger: LedgerStoreBox,
    clock: Box<dyn Clock>,
    selector: Box<dyn RiderSelector>,
    config: DispatchConfig,
}

impl DispatchEngine {
    pub fn new(
        businesses: BusinessStoreBox,
        riders: RiderStoreBox,
        deliveries: DeliveryStoreBox,
        ledger: LedgerStoreBox,
    ) -> Self {
        Self {
            businesses,
            riders,
            deliveries,
            ledger,
            clock: Box::new(SystemClock),
            selector: Box::new(FirstAvailable),
            config: DispatchConfig::default(),
        }
    }

    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_selector(mut self, selector: Box<dyn RiderSelector>) -> Self {
        self.selector = selector;
        self
    }

    pub fn with_config(mut self, config: DispatchConfig) -> Self {
        self.config = config;
        self
    }

    /// Creates a delivery for a business and assigns the first available
    /// rider.
    ///
    /// A subscription-covered ride is claimed against the quota up front and
    /// released again if no rider can be bound, so `rides_used` never counts
    /// a delivery that was not assigned. On an assignment defeat the created
    /// delivery stays `pending` for a later retry rather than being silently
    /// discarded.
    pub async fn request_delivery(
        &self,
        business_id: BusinessId,
        request: DeliveryRequest,
    ) -> Result<DeliveryTicket> {
        let business = self
            .businesses
            .get(business_id)
            .await?
            .ok_or(Error::NotFound("business"))?;
        let covered = business.subscription_covered();

        if covered {
            self.claim_ride(business_id).await?;
        }

        let pool = self.riders.list_available().await?;
        if pool.is_empty() {
            if covered {
                self.release_ride(business_id).await;
            }
            return Err(Error::NoRiderAvailable);
        }

        let now = self.clock.now();
        let price = if covered {
            Money::ZERO
        } else {
            Money::from_mad(FLAT_REQUEST_PRICE_MAD)
        };
        let delivery = Delivery::new(
            business.id,
            request,
            price,
            Money::from_mad(FLAT_REQUEST_COMMISSION_MAD),
            now,
        );
        self.deliveries.create(delivery.clone()).await?;
        debug!(delivery_id = %delivery.id, business = %business.name, "delivery created");

        match self.bind_rider(delivery.id, pool).await {
            Ok(ticket) => {
                info!(
                    delivery_id = %ticket.delivery.id,
                    rider = %ticket.rider.name,
                    strategy = self.selector.name(),
                    "delivery assigned"
                );
                Ok(ticket)
            }
            Err(err) => {
                // The pending delivery is kept for retry; only the quota
                // claim is compensated.
                if covered {
                    self.release_ride(business_id).await;
                }
                warn!(delivery_id = %delivery.id, error = %err, "assignment failed, delivery left pending");
                Err(err)
            }
        }
    }

    /// Explicit accept by a rider, the second entry point into
    /// `pending -> accepted`.
    pub async fn accept_delivery(
        &self,
        delivery_id: DeliveryId,
        rider_id: RiderId,
    ) -> Result<DeliveryTicket> {
        let delivery = self
            .deliveries
            .get(delivery_id)
            .await?
            .ok_or(Error::NotFound("delivery"))?;
        if delivery.status != DeliveryStatus::Pending {
            return Err(Error::InvalidTransition {
                from: delivery.status,
                action: "accept",
            });
        }

        let mut rider = self
            .riders
            .get(rider_id)
            .await?
            .ok_or(Error::NotFound("rider"))?;
        rider.mark_busy()?;
        let rider = match self.riders.update(rider).await {
            Ok(rider) => rider,
            Err(Error::VersionConflict) => return Err(Error::AssignmentConflict),
            Err(err) => return Err(err),
        };

        let now = self.clock.now();
        match self
            .mutate_delivery(delivery_id, |d| d.accept(rider.id, now))
            .await
        {
            Ok(delivery) => {
                info!(delivery_id = %delivery.id, rider = %rider.name, "delivery accepted");
                Ok(DeliveryTicket { delivery, rider })
            }
            Err(err) => {
                // Another caller took the delivery between our two writes;
                // put the rider back in the pool.
                self.release_rider(rider.id).await;
                Err(err)
            }
        }
    }

    /// `accepted -> picked_up`.
    pub async fn mark_picked_up(&self, delivery_id: DeliveryId) -> Result<Delivery> {
        let now = self.clock.now();
        let delivery = self
            .mutate_delivery(delivery_id, |d| d.mark_picked_up(now))
            .await?;
        debug!(delivery_id = %delivery.id, "delivery picked up");
        Ok(delivery)
    }

    /// `picked_up -> in_transit`.
    pub async fn mark_in_transit(&self, delivery_id: DeliveryId) -> Result<Delivery> {
        let delivery = self
            .mutate_delivery(delivery_id, |d| d.mark_in_transit())
            .await?;
        debug!(delivery_id = %delivery.id, "delivery in transit");
        Ok(delivery)
    }

    /// `in_transit -> delivered`, paying the rider.
    ///
    /// The delivery is terminalized first, so a second call fails with
    /// `InvalidTransition` before any rider counter moves. The rider's
    /// counter bump, earnings credit and release back to `available` land in
    /// one store write.
    pub async fn mark_delivered(&self, delivery_id: DeliveryId) -> Result<DeliveryTicket> {
        let now = self.clock.now();
        let current = self
            .deliveries
            .get(delivery_id)
            .await?
            .ok_or(Error::NotFound("delivery"))?;
        let rider_id = current.rider_id.ok_or(Error::InvalidTransition {
            from: current.status,
            action: "deliver",
        })?;
        let rider = self
            .riders
            .get(rider_id)
            .await?
            .ok_or(Error::NotFound("rider"))?;

        let commission = match self.config.commission_policy {
            CommissionPolicy::LockedAtRequest => current.rider_commission,
            CommissionPolicy::TieredAtCompletion => pricing::commission_rate(rider.total_deliveries),
        };

        let delivery = self
            .mutate_delivery(delivery_id, |d| {
                d.mark_delivered(now)?;
                d.rider_commission = commission;
                Ok(())
            })
            .await?;

        let rider = self.pay_rider(rider_id, commission).await?;

        self.ledger
            .append(LedgerEntry::new(
                rider.user_id,
                LedgerEntryKind::Commission,
                commission,
                delivery.payment_method.to_string(),
                format!("commission for delivery {}", delivery.id),
                now,
            ))
            .await?;

        info!(
            delivery_id = %delivery.id,
            rider = %rider.name,
            commission = %commission,
            "delivery completed"
        );
        Ok(DeliveryTicket { delivery, rider })
    }

    /// Cancels a non-terminal delivery and releases its rider, if any.
    pub async fn cancel_delivery(&self, delivery_id: DeliveryId) -> Result<Delivery> {
        let delivery = self.mutate_delivery(delivery_id, |d| d.cancel()).await?;
        if let Some(rider_id) = delivery.rider_id {
            self.release_rider(rider_id).await;
        }
        info!(delivery_id = %delivery.id, "delivery cancelled");
        Ok(delivery)
    }

    /// Toggles a rider between available and offline.
    ///
    /// Going offline is unconditional (the logout path). Going online while a
    /// non-terminal delivery is still bound keeps the rider `busy`, so the
    /// status always reflects the active binding.
    pub async fn set_rider_availability(&self, rider_id: RiderId, online: bool) -> Result<Rider> {
        if !online {
            return self
                .mutate_rider(rider_id, |r| {
                    r.mark_offline();
                    Ok(())
                })
                .await;
        }

        let active = self.deliveries.list_active_by_rider(rider_id).await?;
        self.mutate_rider(rider_id, move |r| {
            if active.is_empty() {
                r.mark_available();
            } else {
                r.status = RiderStatus::Busy;
            }
            Ok(())
        })
        .await
    }

    /// Adds pay-as-you-go credit to a business wallet.
    pub async fn add_wallet_credits(
        &self,
        business_id: BusinessId,
        credit: Credit,
    ) -> Result<Business> {
        let business = self
            .mutate_business(business_id, |b| {
                b.add_credits(credit);
                Ok(())
            })
            .await?;
        self.ledger
            .append(LedgerEntry::new(
                business.user_id,
                LedgerEntryKind::TopUp,
                credit.into(),
                "wallet",
                format!("wallet top-up for {}", business.name),
                self.clock.now(),
            ))
            .await?;
        info!(business = %business.name, amount = %credit.value(), "wallet topped up");
        Ok(business)
    }

    /// Records a rider's last known position.
    pub async fn update_rider_location(
        &self,
        rider_id: RiderId,
        location: Location,
    ) -> Result<Rider> {
        let now = self.clock.now();
        self.mutate_rider(rider_id, move |r| {
            r.record_location(location, now);
            Ok(())
        })
        .await
    }

    // ---- query surface -------------------------------------------------

    pub async fn available_riders(&self) -> Result<Vec<Rider>> {
        self.riders.list_available().await
    }

    pub async fn deliveries_for_business(
        &self,
        business_id: BusinessId,
    ) -> Result<Vec<DeliveryView>> {
        let deliveries = self.deliveries.list_by_business(business_id).await?;
        self.hydrate(deliveries).await
    }

    pub async fn deliveries_for_rider(&self, rider_id: RiderId) -> Result<Vec<DeliveryView>> {
        let deliveries = self.deliveries.list_by_rider(rider_id).await?;
        self.hydrate(deliveries).await
    }

    pub async fn active_deliveries(&self) -> Result<Vec<DeliveryView>> {
        let deliveries = self.deliveries.list_active().await?;
        self.hydrate(deliveries).await
    }

    pub async fn all_deliveries(&self) -> Result<Vec<DeliveryView>> {
        let deliveries = self.deliveries.list().await?;
        self.hydrate(deliveries).await
    }

    pub async fn business_for_user(&self, user_id: UserId) -> Result<Option<Business>> {
        self.businesses.get_by_user_id(user_id).await
    }

    pub async fn rider_for_user(&self, user_id: UserId) -> Result<Option<Rider>> {
        self.riders.get_by_user_id(user_id).await
    }

    pub async fn ledger_for_user(&self, user_id: UserId) -> Result<Vec<LedgerEntry>> {
        self.ledger.list_by_user(user_id).await
    }

    // ---- internals -----------------------------------------------------

    /// Claims one quota ride with a bounded compare-and-set loop.
    async fn claim_ride(&self, business_id: BusinessId) -> Result<()> {
        for _ in 0..self.config.max_assignment_attempts {
            let mut business = self
                .businesses
                .get(business_id)
                .await?
                .ok_or(Error::NotFound("business"))?;
            business.consume_ride()?;
            match self.businesses.update(business).await {
                Ok(_) => return Ok(()),
                Err(Error::VersionConflict) => {
                    debug!(%business_id, "quota claim lost the race, retrying");
                    continue;
                }
                Err(err) => return Err(err),
            }
        }
        Err(Error::AssignmentConflict)
    }

    /// Returns a claimed ride. Best effort: a failed compensation is logged,
    /// never surfaced over the primary failure.
    async fn release_ride(&self, business_id: BusinessId) {
        for _ in 0..self.config.max_assignment_attempts {
            let business = match self.businesses.get(business_id).await {
                Ok(Some(b)) => b,
                Ok(None) => return,
                Err(err) => {
                    warn!(%business_id, error = %err, "could not read business to release ride");
                    return;
                }
            };
            let mut business = business;
            business.release_ride();
            match self.businesses.update(business).await {
                Ok(_) => return,
                Err(Error::VersionConflict) => continue,
                Err(err) => {
                    warn!(%business_id, error = %err, "could not release claimed ride");
                    return;
                }
            }
        }
        warn!(%business_id, "gave up releasing claimed ride after repeated conflicts");
    }

    /// Puts a rider back in the pool. Best effort, used on compensation
    /// paths only.
    async fn release_rider(&self, rider_id: RiderId) {
        for _ in 0..self.config.max_assignment_attempts {
            let mut rider = match self.riders.get(rider_id).await {
                Ok(Some(r)) => r,
                Ok(None) => return,
                Err(err) => {
                    warn!(%rider_id, error = %err, "could not read rider to release");
                    return;
                }
            };
            rider.mark_available();
            match self.riders.update(rider).await {
                Ok(_) => return,
                Err(Error::VersionConflict) => continue,
                Err(err) => {
                    warn!(%rider_id, error = %err, "could not release rider");
                    return;
                }
            }
        }
        warn!(%rider_id, "gave up releasing rider after repeated conflicts");
    }

    /// Applies the completion payout to the rider. The delivery is already
    /// terminal at this point, so giving up would strand it delivered with
    /// the rider busy and unpaid; a lost write is retried against fresh
    /// state until it lands.
    async fn pay_rider(&self, rider_id: RiderId, commission: Money) -> Result<Rider> {
        loop {
            let mut rider = self
                .riders
                .get(rider_id)
                .await?
                .ok_or(Error::NotFound("rider"))?;
            rider.record_completion(commission);
            match self.riders.update(rider).await {
                Ok(rider) => return Ok(rider),
                Err(Error::VersionConflict) => continue,
                Err(err) => return Err(err),
            }
        }
    }

    /// Selects a rider and binds it with a conditional update. A lost race
    /// refreshes the pool and tries again, bounded by the configured attempt
    /// count.
    async fn bind_rider(&self, delivery_id: DeliveryId, initial_pool: Vec<Rider>) -> Result<DeliveryTicket> {
        let mut pool = initial_pool;
        for attempt in 0..self.config.max_assignment_attempts {
            if attempt > 0 {
                pool = self.riders.list_available().await?;
            }
            let Some(candidate) = self.selector.select(&pool) else {
                return Err(Error::NoRiderAvailable);
            };
            let mut rider = candidate.clone();
            rider.mark_busy()?;
            match self.riders.update(rider).await {
                Ok(rider) => {
                    let now = self.clock.now();
                    return match self
                        .mutate_delivery(delivery_id, |d| d.accept(rider.id, now))
                        .await
                    {
                        Ok(delivery) => Ok(DeliveryTicket { delivery, rider }),
                        Err(err) => {
                            // Another session took the delivery between
                            // creation and binding; put the rider back in
                            // the pool.
                            self.release_rider(rider.id).await;
                            Err(err)
                        }
                    };
                }
                Err(Error::VersionConflict) => {
                    debug!(attempt, "rider binding lost the race, reselecting");
                    continue;
                }
                Err(err) => return Err(err),
            }
        }
        Err(Error::AssignmentConflict)
    }

    async fn mutate_delivery<F>(&self, delivery_id: DeliveryId, f: F) -> Result<Delivery>
    where
        F: Fn(&mut Delivery) -> Result<()>,
    {
        for _ in 0..self.config.max_assignment_attempts {
            let mut delivery = self
                .deliveries
                .get(delivery_id)
                .await?
                .ok_or(Error::NotFound("delivery"))?;
            f(&mut delivery)?;
            match self.deliveries.update(delivery).await {
                Ok(delivery) => return Ok(delivery),
                Err(Error::VersionConflict) => continue,
                Err(err) => return Err(err),
            }
        }
        Err(Error::AssignmentConflict)
    }

    async fn mutate_rider<F>(&self, rider_id: RiderId, f: F) -> Result<Rider>
    where
        F: Fn(&mut Rider) -> Result<()>,
    {
        for _ in 0..self.config.max_assignment_attempts {
            let mut rider = self
                .riders
                .get(rider_id)
                .await?
                .ok_or(Error::NotFound("rider"))?;
            f(&mut rider)?;
            match self.riders.update(rider).await {
                Ok(rider) => return Ok(rider),
                Err(Error::VersionConflict) => continue,
                Err(err) => return Err(err),
            }
        }
        Err(Error::AssignmentConflict)
    }

    async fn mutate_business<F>(&self, business_id: BusinessId, f: F) -> Result<Business>
    where
        F: Fn(&mut Business) -> Result<()>,
    {
        for _ in 0..self.config.max_assignment_attempts {
            let mut business = self
                .businesses
                .get(business_id)
                .await?
                .ok_or(Error::NotFound("business"))?;
            f(&mut business)?;
            match self.businesses.update(business).await {
                Ok(business) => return Ok(business),
                Err(Error::VersionConflict) => continue,
                Err(err) => return Err(err),
            }
        }
        Err(Error::AssignmentConflict)
    }

    /// Joins display names into delivery records, tolerating deleted
    /// referents.
    async fn hydrate(&self, deliveries: Vec<Delivery>) -> Result<Vec<DeliveryView>> {
        let mut views = Vec::with_capacity(deliveries.len());
        for delivery in deliveries {
            let business_name = self
                .businesses
                .get(delivery.business_id)
                .await?
                .map(|b| b.name);
            let rider_name = match delivery.rider_id {
                Some(rider_id) => self.riders.get(rider_id).await?.map(|r| r.name),
                None => None,
            };
            views.push(DeliveryView {
                delivery,
                business_name,
                rider_name,
            });
        }
        Ok(views)
    }
}
