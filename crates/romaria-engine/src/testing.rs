//! In-memory test doubles for the gateway traits, plus seed helpers shared
//! by the engine's test suites.

use std::{
  collections::HashMap,
  sync::{
    Mutex,
    atomic::{AtomicBool, AtomicUsize, Ordering},
  },
};

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use romaria_core::{
  event::{Event, RateTier},
  gateway::{
    BlobStore, Charge, ChargeRequest, ChargeStatus, MenuOption, MessageSender,
    PaymentGateway,
  },
  registration::ParticipantDraft,
  store::BotStore,
};
use romaria_store_sqlite::SqliteStore;

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct FakeError(pub &'static str);

// ─── Messaging ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
  Text { to: String, body: String },
  Image { to: String, caption: String },
  Menu { to: String, header: String, options: Vec<MenuOption> },
}

/// Records every outbound message; can be told to fail all sends.
#[derive(Default)]
pub struct RecordingMessenger {
  sent: Mutex<Vec<Sent>>,
  fail: AtomicBool,
}

impl RecordingMessenger {
  pub fn fail_sends(&self) {
    self.fail.store(true, Ordering::SeqCst);
  }

  pub fn sent(&self) -> Vec<Sent> {
    self.sent.lock().unwrap().clone()
  }

  pub fn texts_to(&self, to: &str) -> Vec<String> {
    self
      .sent()
      .into_iter()
      .filter_map(|s| match s {
        Sent::Text { to: t, body } if t == to => Some(body),
        _ => None,
      })
      .collect()
  }

  pub fn images_to(&self, to: &str) -> Vec<String> {
    self
      .sent()
      .into_iter()
      .filter_map(|s| match s {
        Sent::Image { to: t, caption } if t == to => Some(caption),
        _ => None,
      })
      .collect()
  }

  pub fn menus_to(&self, to: &str) -> Vec<(String, Vec<MenuOption>)> {
    self
      .sent()
      .into_iter()
      .filter_map(|s| match s {
        Sent::Menu { to: t, header, options } if t == to => {
          Some((header, options))
        }
        _ => None,
      })
      .collect()
  }

  fn record(&self, entry: Sent) -> Result<(), FakeError> {
    if self.fail.load(Ordering::SeqCst) {
      return Err(FakeError("send failed"));
    }
    self.sent.lock().unwrap().push(entry);
    Ok(())
  }
}

impl MessageSender for RecordingMessenger {
  type Error = FakeError;

  async fn send_text(&self, to: &str, body: &str) -> Result<(), FakeError> {
    self.record(Sent::Text { to: to.to_string(), body: body.to_string() })
  }

  async fn send_image(
    &self,
    to: &str,
    _image_base64: &str,
    caption: &str,
  ) -> Result<(), FakeError> {
    self.record(Sent::Image { to: to.to_string(), caption: caption.to_string() })
  }

  async fn send_menu(
    &self,
    to: &str,
    header: &str,
    options: &[MenuOption],
  ) -> Result<(), FakeError> {
    self.record(Sent::Menu {
      to:      to.to_string(),
      header:  header.to_string(),
      options: options.to_vec(),
    })
  }
}

// ─── Payments ────────────────────────────────────────────────────────────────

/// In-memory payment provider. Charges it creates (or is seeded with) can be
/// flipped to approved to drive reconciliation.
#[derive(Default)]
pub struct FakeGateway {
  charges:         Mutex<HashMap<String, Charge>>,
  created:         AtomicUsize,
  fail_create:     AtomicBool,
  approve_instant: AtomicBool,
}

impl FakeGateway {
  pub fn fail_create(&self) {
    self.fail_create.store(true, Ordering::SeqCst);
  }

  pub fn approve_instantly(&self) {
    self.approve_instant.store(true, Ordering::SeqCst);
  }

  pub fn charges_created(&self) -> usize {
    self.created.load(Ordering::SeqCst)
  }

  /// Register a pending charge without going through `create_charge`.
  pub fn seed_pending_charge(&self, pix_code: &str) -> String {
    let id = format!("chg_{}", Uuid::new_v4().simple());
    self.charges.lock().unwrap().insert(id.clone(), Charge {
      provider:            "fake".to_string(),
      provider_payment_id: id.clone(),
      status:              ChargeStatus::Pending,
      pix_code:            pix_code.to_string(),
      pix_qr_image:        None,
      expires_at:          None,
    });
    id
  }

  pub fn approve(&self, provider_payment_id: &str) {
    let mut charges = self.charges.lock().unwrap();
    let charge = charges
      .get_mut(provider_payment_id)
      .expect("charge must exist before approval");
    charge.status = ChargeStatus::Approved;
  }
}

impl PaymentGateway for FakeGateway {
  type Error = FakeError;

  async fn create_charge(&self, request: &ChargeRequest) -> Result<Charge, FakeError> {
    if self.fail_create.load(Ordering::SeqCst) {
      return Err(FakeError("gateway unavailable"));
    }

    let status = if self.approve_instant.load(Ordering::SeqCst) {
      ChargeStatus::Approved
    } else {
      ChargeStatus::Pending
    };
    let id = format!("chg_{}", self.created.fetch_add(1, Ordering::SeqCst));
    let charge = Charge {
      provider:            "fake".to_string(),
      provider_payment_id: id.clone(),
      status,
      pix_code:            format!("pix-{}", request.idempotency_key),
      pix_qr_image:        Some("aW1hZ2U=".to_string()),
      expires_at:          Some(Utc::now() + Duration::hours(24)),
    };
    self.charges.lock().unwrap().insert(id, charge.clone());
    Ok(charge)
  }

  async fn fetch_charge(&self, provider_payment_id: &str) -> Result<Charge, FakeError> {
    self
      .charges
      .lock()
      .unwrap()
      .get(provider_payment_id)
      .cloned()
      .ok_or(FakeError("unknown charge"))
  }
}

// ─── Blob storage ────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryBlobs {
  blobs: Mutex<HashMap<String, Vec<u8>>>,
  fail:  AtomicBool,
}

impl MemoryBlobs {
  pub fn fail_puts(&self) {
    self.fail.store(true, Ordering::SeqCst);
  }

  pub fn names(&self) -> Vec<String> {
    let mut names: Vec<_> = self.blobs.lock().unwrap().keys().cloned().collect();
    names.sort();
    names
  }

  pub fn get(&self, name: &str) -> Option<Vec<u8>> {
    self.blobs.lock().unwrap().get(name).cloned()
  }
}

impl BlobStore for MemoryBlobs {
  type Error = FakeError;

  async fn put(&self, name: &str, bytes: &[u8]) -> Result<(), FakeError> {
    if self.fail.load(Ordering::SeqCst) {
      return Err(FakeError("blob store unavailable"));
    }
    self.blobs.lock().unwrap().insert(name.to_string(), bytes.to_vec());
    Ok(())
  }
}

// ─── Seed helpers ────────────────────────────────────────────────────────────

pub fn draft(name: &str, cpf: &str) -> ParticipantDraft {
  ParticipantDraft {
    name: Some(name.to_string()),
    cpf: Some(cpf.to_string()),
    ..Default::default()
  }
}

/// An event open right now with a single active rate tier at `price`.
pub async fn seed_event_with_tier(
  store: &SqliteStore,
  name: &str,
  price: Decimal,
) -> Event {
  let now = Utc::now();
  let event = Event {
    id:        Uuid::new_v4(),
    name:      name.to_string(),
    opens_at:  now - Duration::days(7),
    closes_at: now + Duration::days(7),
  };
  store.insert_event(event.clone()).await.unwrap();
  store
    .insert_rate_tier(RateTier {
      id:        Uuid::new_v4(),
      event_id:  event.id,
      name:      "Lote único".to_string(),
      price,
      starts_at: now - Duration::days(7),
      ends_at:   now + Duration::days(7),
    })
    .await
    .unwrap();
  event
}
