use super::ids::{RiderId, UserId};
use super::money::Money;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiderStatus {
    Available,
    Busy,
    Offline,
}

impl fmt::Display for RiderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiderStatus::Available => "available",
            RiderStatus::Busy => "busy",
            RiderStatus::Offline => "offline",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

/// A courier. At most one non-terminal delivery may be bound to a rider at
/// any instant; `status == Busy` exactly while such a delivery exists.
///
/// `total_deliveries` and `earnings_this_month` only ever increase while the
/// month is open. `version` backs compare-and-set updates in the stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rider {
    pub id: RiderId,
    pub user_id: UserId,
    pub name: String,
    pub phone: String,
    pub status: RiderStatus,
    pub total_deliveries: u32,
    pub earnings_this_month: Money,
    pub current_location: Option<Location>,
    pub last_location_update: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub version: u64,
}

impl Rider {
    /// Onboards a rider. New riders start offline until they toggle online.
    pub fn new(user_id: UserId, name: String, phone: String, now: DateTime<Utc>) -> Self {
        Self {
            id: RiderId::generate(),
            user_id,
            name,
            phone,
            status: RiderStatus::Offline,
            total_deliveries: 0,
            earnings_this_month: Money::ZERO,
            current_location: None,
            last_location_update: None,
            created_at: now,
            version: 0,
        }
    }

    pub fn is_available(&self) -> bool {
        self.status == RiderStatus::Available
    }

    /// Binds the rider to a delivery. Fails unless currently available, so a
    /// stale read can never double-book a rider.
    pub fn mark_busy(&mut self) -> Result<()> {
        if !self.is_available() {
            return Err(Error::AssignmentConflict);
        }
        self.status = RiderStatus::Busy;
        Ok(())
    }

    pub fn mark_available(&mut self) {
        self.status = RiderStatus::Available;
    }

    pub fn mark_offline(&mut self) {
        self.status = RiderStatus::Offline;
    }

    /// Applies the completion side effects in one write: lifetime counter,
    /// monthly earnings and release back to the available pool.
    pub fn record_completion(&mut self, commission: Money) {
        self.total_deliveries += 1;
        self.earnings_this_month += commission;
        self.status = RiderStatus::Available;
    }

    pub fn record_location(&mut self, location: Location, now: DateTime<Utc>) {
        self.current_location = Some(location);
        self.last_location_update = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rider() -> Rider {
        Rider::new(
            UserId::generate(),
            "Ahmed Benani".into(),
            "+212 6 12 34 56 78".into(),
            Utc::now(),
        )
    }

    #[test]
    fn test_new_rider_starts_offline() {
        let r = rider();
        assert_eq!(r.status, RiderStatus::Offline);
        assert!(!r.is_available());
    }

    #[test]
    fn test_mark_busy_requires_available() {
        let mut r = rider();
        assert!(matches!(r.mark_busy(), Err(Error::AssignmentConflict)));

        r.mark_available();
        r.mark_busy().unwrap();
        assert_eq!(r.status, RiderStatus::Busy);

        // Already busy: a second binding is refused
        assert!(matches!(r.mark_busy(), Err(Error::AssignmentConflict)));
    }

    #[test]
    fn test_record_completion_is_one_unit() {
        let mut r = rider();
        r.mark_available();
        r.mark_busy().unwrap();

        r.record_completion(Money::from_mad(15));
        assert_eq!(r.total_deliveries, 1);
        assert_eq!(r.earnings_this_month, Money::from_mad(15));
        assert_eq!(r.status, RiderStatus::Available);
    }

    #[test]
    fn test_record_location() {
        let mut r = rider();
        let now = Utc::now();
        r.record_location(Location { lat: 35.7595, lng: -5.8340 }, now);
        assert_eq!(r.current_location.unwrap().lat, 35.7595);
        assert_eq!(r.last_location_update, Some(now));
    }
}
