//! Reference entities consumed read-only by the engine: events, rate tiers,
//! districts and churches. Administration of these lives outside the core.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An event open for registration within a date window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
  pub id:        Uuid,
  pub name:      String,
  pub opens_at:  DateTime<Utc>,
  pub closes_at: DateTime<Utc>,
}

impl Event {
  pub fn is_open_at(&self, now: DateTime<Utc>) -> bool {
    self.opens_at <= now && now < self.closes_at
  }
}

/// A named price valid only within a date window, scoped to one event.
///
/// The tier active at registration-creation time fixes the registration's
/// total; later tier changes never reprice an existing registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateTier {
  pub id:        Uuid,
  pub event_id:  Uuid,
  pub name:      String,
  pub price:     Decimal,
  pub starts_at: DateTime<Utc>,
  pub ends_at:   DateTime<Utc>,
}

impl RateTier {
  pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
    self.starts_at <= now && now < self.ends_at
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct District {
  pub id:   Uuid,
  pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Church {
  pub id:          Uuid,
  pub district_id: Uuid,
  pub name:        String,
}
