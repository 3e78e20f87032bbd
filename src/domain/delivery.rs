use super::ids::{BusinessId, DeliveryId, RiderId};
use super::money::Money;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Pending,
    Accepted,
    PickedUp,
    InTransit,
    Delivered,
    Cancelled,
}

impl DeliveryStatus {
    /// Terminal states admit no further transition.
    pub fn is_terminal(&self) -> bool {
        matches!(self, DeliveryStatus::Delivered | DeliveryStatus::Cancelled)
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DeliveryStatus::Pending => "pending",
            DeliveryStatus::Accepted => "accepted",
            DeliveryStatus::PickedUp => "picked_up",
            DeliveryStatus::InTransit => "in_transit",
            DeliveryStatus::Delivered => "delivered",
            DeliveryStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Subscription,
    Wallet,
    Pack,
    Payg,
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PaymentMethod::Subscription => "subscription",
            PaymentMethod::Wallet => "wallet",
            PaymentMethod::Pack => "pack",
            PaymentMethod::Payg => "payg",
        };
        f.write_str(s)
    }
}

impl FromStr for PaymentMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "subscription" => Ok(PaymentMethod::Subscription),
            "wallet" => Ok(PaymentMethod::Wallet),
            "pack" => Ok(PaymentMethod::Pack),
            "payg" => Ok(PaymentMethod::Payg),
            other => Err(Error::Validation(format!("unknown payment method: {other}"))),
        }
    }
}

/// A delivery and its status state machine:
/// `pending -> accepted -> picked_up -> in_transit -> delivered`, with
/// `cancelled` reachable from any non-terminal state.
///
/// Each timestamp is set exactly once, when its state is first reached, and
/// the sequence is non-decreasing. Business and rider are referenced by id
/// only; display names are joined at query time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delivery {
    pub id: DeliveryId,
    pub business_id: BusinessId,
    pub rider_id: Option<RiderId>,
    pub pickup_address: String,
    pub pickup_lat: f64,
    pub pickup_lng: f64,
    pub dropoff_address: String,
    pub dropoff_lat: f64,
    pub dropoff_lng: f64,
    /// Minutes.
    pub estimated_duration: u32,
    /// Minutes, set at completion.
    pub actual_duration: Option<u32>,
    pub price: Money,
    pub rider_commission: Money,
    pub status: DeliveryStatus,
    pub payment_method: PaymentMethod,
    pub created_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub picked_up_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub version: u64,
}

/// The caller-supplied half of a new delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryRequest {
    pub pickup_address: String,
    pub pickup_lat: f64,
    pub pickup_lng: f64,
    pub dropoff_address: String,
    pub dropoff_lat: f64,
    pub dropoff_lng: f64,
    pub estimated_duration: u32,
    pub payment_method: PaymentMethod,
}

impl Delivery {
    pub fn new(
        business_id: BusinessId,
        request: DeliveryRequest,
        price: Money,
        rider_commission: Money,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: DeliveryId::generate(),
            business_id,
            rider_id: None,
            pickup_address: request.pickup_address,
            pickup_lat: request.pickup_lat,
            pickup_lng: request.pickup_lng,
            dropoff_address: request.dropoff_address,
            dropoff_lat: request.dropoff_lat,
            dropoff_lng: request.dropoff_lng,
            estimated_duration: request.estimated_duration,
            actual_duration: None,
            price,
            rider_commission,
            status: DeliveryStatus::Pending,
            payment_method: request.payment_method,
            created_at: now,
            accepted_at: None,
            picked_up_at: None,
            completed_at: None,
            version: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        !self.status.is_terminal()
    }

    fn guard(&self, expected: DeliveryStatus, action: &'static str) -> Result<()> {
        if self.status == expected {
            Ok(())
        } else {
            Err(Error::InvalidTransition {
                from: self.status,
                action,
            })
        }
    }

    /// `pending -> accepted`, binding the rider.
    pub fn accept(&mut self, rider_id: RiderId, now: DateTime<Utc>) -> Result<()> {
        self.guard(DeliveryStatus::Pending, "accept")?;
        self.rider_id = Some(rider_id);
        self.status = DeliveryStatus::Accepted;
        self.accepted_at = Some(now);
        Ok(())
    }

    /// `accepted -> picked_up`.
    pub fn mark_picked_up(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.guard(DeliveryStatus::Accepted, "pick up")?;
        self.status = DeliveryStatus::PickedUp;
        self.picked_up_at = Some(now);
        Ok(())
    }

    /// `picked_up -> in_transit`.
    pub fn mark_in_transit(&mut self) -> Result<()> {
        self.guard(DeliveryStatus::PickedUp, "transit")?;
        self.status = DeliveryStatus::InTransit;
        Ok(())
    }

    /// `in_transit -> delivered`. Computes the actual duration from the
    /// pickup timestamp, falling back to the estimate if it is absent.
    pub fn mark_delivered(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.guard(DeliveryStatus::InTransit, "deliver")?;
        self.actual_duration = Some(match self.picked_up_at {
            Some(picked_up_at) => {
                let seconds = (now - picked_up_at).num_seconds().max(0);
                u32::try_from((seconds + 30) / 60).unwrap_or(u32::MAX)
            }
            None => self.estimated_duration,
        });
        self.status = DeliveryStatus::Delivered;
        self.completed_at = Some(now);
        Ok(())
    }

    /// Any non-terminal state `-> cancelled`.
    pub fn cancel(&mut self) -> Result<()> {
        if self.status.is_terminal() {
            return Err(Error::InvalidTransition {
                from: self.status,
                action: "cancel",
            });
        }
        self.status = DeliveryStatus::Cancelled;
        Ok(())
    }
}
