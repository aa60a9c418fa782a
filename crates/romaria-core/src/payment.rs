//! The local payment record mirroring a gateway-issued PIX charge.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
  Pending,
  Paid,
}

/// One row per registration under normal operation. Created once by the
/// settlement pipeline; flipped to `Paid` only by webhook reconciliation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
  pub id:                  Uuid,
  pub registration_id:     Uuid,
  pub provider:            String,
  pub provider_payment_id: String,
  pub status:              PaymentStatus,
  /// The copyable PIX text token.
  pub pix_code:            String,
  /// Base64 PNG of the scannable code, when the provider supplies one.
  pub pix_qr_image:        Option<String>,
  pub expires_at:          Option<DateTime<Utc>>,
  pub created_at:          DateTime<Utc>,
}

/// Input to [`crate::store::BotStore::insert_payment`].
#[derive(Debug, Clone)]
pub struct NewPayment {
  pub registration_id:     Uuid,
  pub provider:            String,
  pub provider_payment_id: String,
  pub status:              PaymentStatus,
  pub pix_code:            String,
  pub pix_qr_image:        Option<String>,
  pub expires_at:          Option<DateTime<Utc>>,
}
