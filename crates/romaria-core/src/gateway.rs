//! Collaborator traits for the messaging provider, the payment provider and
//! receipt blob storage.
//!
//! The engine depends on these seams only; the `reqwest` implementations live
//! in `romaria-gateway`, and tests substitute recording mocks.

use std::future::Future;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

// ─── Messaging ───────────────────────────────────────────────────────────────

/// One choice in an interactive "pick an option" prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuOption {
  pub id:    String,
  pub label: String,
}

impl MenuOption {
  pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
    Self { id: id.into(), label: label.into() }
  }
}

/// Outbound delivery to the messaging provider.
///
/// Implementations retry a fixed small number of times per send; exhausting
/// the attempts surfaces an error and the caller decides whether that is
/// fatal to the surrounding step. Interactive prompts degrade through the
/// provider's structured formats down to plain numbered text, which is
/// always reachable.
pub trait MessageSender: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn send_text<'a>(
    &'a self,
    to: &'a str,
    body: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Send a base64-encoded PNG with a caption (the PIX QR image).
  fn send_image<'a>(
    &'a self,
    to: &'a str,
    image_base64: &'a str,
    caption: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Send a "choose an option" prompt through the graded fallback chain.
  fn send_menu<'a>(
    &'a self,
    to: &'a str,
    header: &'a str,
    options: &'a [MenuOption],
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}

// ─── Payments ────────────────────────────────────────────────────────────────

/// The gateway's view of a charge, both at creation and on re-fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChargeStatus {
  Pending,
  Approved,
  Rejected,
  Expired,
}

#[derive(Debug, Clone)]
pub struct ChargeRequest {
  pub amount:          Decimal,
  pub description:     String,
  pub payer_name:      String,
  pub payer_cpf:       String,
  /// Derived from the registration id; guards against a duplicate charge if
  /// creation is retried after a timeout.
  pub idempotency_key: String,
}

#[derive(Debug, Clone)]
pub struct Charge {
  pub provider:            String,
  pub provider_payment_id: String,
  pub status:              ChargeStatus,
  pub pix_code:            String,
  pub pix_qr_image:        Option<String>,
  pub expires_at:          Option<DateTime<Utc>>,
}

/// The PIX payment provider: create a charge, re-fetch its authoritative
/// state. Webhook bodies are never trusted for status; [`fetch_charge`]
/// is the source of truth.
///
/// [`fetch_charge`]: PaymentGateway::fetch_charge
pub trait PaymentGateway: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn create_charge<'a>(
    &'a self,
    request: &'a ChargeRequest,
  ) -> impl Future<Output = Result<Charge, Self::Error>> + Send + 'a;

  fn fetch_charge<'a>(
    &'a self,
    provider_payment_id: &'a str,
  ) -> impl Future<Output = Result<Charge, Self::Error>> + Send + 'a;
}

// ─── Blob storage ────────────────────────────────────────────────────────────

/// Receipt artifact storage. The name is a relative path such as
/// `receipts/<registration-id>.html`.
pub trait BlobStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn put<'a>(
    &'a self,
    name: &'a str,
    bytes: &'a [u8],
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}
