//! Payment-webhook reconciliation.
//!
//! Webhook bodies only carry a pointer to the charge; the authoritative
//! status always comes from a fresh [`PaymentGateway::fetch_charge`]. The
//! whole routine is idempotent: a replayed webhook for an already-settled
//! payment is a no-op.

use std::sync::Arc;

use tracing::{info, warn};

use romaria_core::{
  Error, Result,
  gateway::{BlobStore, ChargeStatus, MessageSender, PaymentGateway},
  payment::{Payment, PaymentStatus},
  registration::RegistrationStatus,
  store::BotStore,
};

use crate::{receipt, replies};

/// What a reconciliation pass concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
  /// The provider id matches no payment we issued. Logged and ignored.
  UnknownPayment,
  /// Already settled by an earlier webhook or claim; nothing re-done.
  AlreadyPaid,
  /// The gateway still reports the charge as unsettled.
  StillPending,
  /// Flipped to paid: payment, registration and ledger updated, receipt
  /// published, confirmation sent.
  Settled,
}

pub struct Reconciler<S, M, P, B> {
  store:           Arc<S>,
  messenger:       Arc<M>,
  gateway:         Arc<P>,
  blobs:           Arc<B>,
  public_base_url: String,
}

impl<S, M, P, B> Reconciler<S, M, P, B>
where
  S: BotStore,
  M: MessageSender,
  P: PaymentGateway,
  B: BlobStore,
{
  pub fn new(
    store: Arc<S>,
    messenger: Arc<M>,
    gateway: Arc<P>,
    blobs: Arc<B>,
    public_base_url: String,
  ) -> Self {
    Self { store, messenger, gateway, blobs, public_base_url }
  }

  /// Reconcile one charge by its provider id.
  pub async fn apply(&self, provider_payment_id: &str) -> Result<ReconcileOutcome> {
    let Some(payment) = self
      .store
      .payment_by_provider_id(provider_payment_id)
      .await
      .map_err(Error::store)?
    else {
      warn!(provider_payment_id, "webhook for unknown payment");
      return Ok(ReconcileOutcome::UnknownPayment);
    };

    if payment.status == PaymentStatus::Paid {
      return Ok(ReconcileOutcome::AlreadyPaid);
    }

    let charge = self
      .gateway
      .fetch_charge(provider_payment_id)
      .await
      .map_err(|e| Error::gateway(&payment.provider, e))?;
    if charge.status != ChargeStatus::Approved {
      info!(provider_payment_id, status = ?charge.status, "charge not settled yet");
      return Ok(ReconcileOutcome::StillPending);
    }

    self.settle(&payment).await?;
    Ok(ReconcileOutcome::Settled)
  }

  async fn settle(&self, payment: &Payment) -> Result<()> {
    self
      .store
      .set_payment_status(payment.id, PaymentStatus::Paid)
      .await
      .map_err(Error::store)?;
    self
      .store
      .set_registration_status(payment.registration_id, RegistrationStatus::Paid)
      .await
      .map_err(Error::store)?;
    self
      .store
      .mark_ledger_paid(payment.registration_id)
      .await
      .map_err(Error::store)?;

    info!(registration_id = %payment.registration_id, "payment settled");

    // Receipt publication and the confirmation message are best-effort: the
    // settlement above is already durable, and a replayed webhook cannot
    // reach this point again.
    let registration = self
      .store
      .get_registration(payment.registration_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::RegistrationNotFound(payment.registration_id))?;
    let participants = self
      .store
      .participants_of(registration.id)
      .await
      .map_err(Error::store)?;
    let event = self
      .store
      .get_event(registration.event_id)
      .await
      .map_err(Error::store)?;
    let event_name = event.map(|e| e.name).unwrap_or_default();

    let name = receipt::blob_name(&registration);
    let html = receipt::render(&event_name, &registration, &participants);
    match self.blobs.put(&name, html.as_bytes()).await {
      Ok(()) => {
        let link = format!("{}/{}", self.public_base_url.trim_end_matches('/'), name);
        if let Err(e) = self
          .messenger
          .send_text(&registration.contact_phone, &replies::receipt_ready(&link))
          .await
        {
          warn!(registration_id = %registration.id, error = %e, "receipt link undeliverable");
        }
      }
      Err(e) => {
        warn!(registration_id = %registration.id, error = %e, "receipt upload failed");
      }
    }

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use romaria_store_sqlite::SqliteStore;
  use rust_decimal_macros::dec;

  use romaria_core::{payment::NewPayment, registration::NewRegistration};

  use crate::testing::{
    FakeGateway, MemoryBlobs, RecordingMessenger, draft, seed_event_with_tier,
  };

  struct Fixture {
    reconciler: Reconciler<SqliteStore, RecordingMessenger, FakeGateway, MemoryBlobs>,
    store:      Arc<SqliteStore>,
    messenger:  Arc<RecordingMessenger>,
    gateway:    Arc<FakeGateway>,
    blobs:      Arc<MemoryBlobs>,
  }

  async fn fixture() -> Fixture {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let messenger = Arc::new(RecordingMessenger::default());
    let gateway = Arc::new(FakeGateway::default());
    let blobs = Arc::new(MemoryBlobs::default());
    let reconciler = Reconciler::new(
      store.clone(),
      messenger.clone(),
      gateway.clone(),
      blobs.clone(),
      "https://files.romaria.org".to_string(),
    );
    Fixture { reconciler, store, messenger, gateway, blobs }
  }

  /// Seed a pending registration + payment and register the charge with the
  /// fake gateway.
  async fn seed_pending(fx: &Fixture) -> (uuid::Uuid, String) {
    let event = seed_event_with_tier(&fx.store, "Romaria 2026", dec!(80.00)).await;
    let registration = fx
      .store
      .insert_registration(NewRegistration {
        event_id:      event.id,
        contact_phone: "5561999887766".to_string(),
        total:         dec!(80.00),
      })
      .await
      .unwrap();
    let d = draft("Alice Souza", "52998224725");
    fx.store
      .insert_participant(romaria_core::registration::NewParticipant {
        registration_id: registration.id,
        event_id:        event.id,
        name:            d.name.clone().unwrap(),
        cpf:             d.cpf.clone().unwrap(),
        birthdate:       None,
        gender:          None,
        district_id:     None,
        church_id:       None,
        phone:           None,
      })
      .await
      .unwrap();

    let provider_id = fx.gateway.seed_pending_charge("pix-code-123");
    fx.store
      .insert_payment(NewPayment {
        registration_id:     registration.id,
        provider:            "fake".to_string(),
        provider_payment_id: provider_id.clone(),
        status:              PaymentStatus::Pending,
        pix_code:            "pix-code-123".to_string(),
        pix_qr_image:        None,
        expires_at:          None,
      })
      .await
      .unwrap();

    (registration.id, provider_id)
  }

  #[tokio::test]
  async fn unknown_provider_id_is_ignored() {
    let fx = fixture().await;
    let outcome = fx.reconciler.apply("no-such-charge").await.unwrap();
    assert_eq!(outcome, ReconcileOutcome::UnknownPayment);
  }

  #[tokio::test]
  async fn unapproved_charge_stays_pending() {
    let fx = fixture().await;
    let (registration_id, provider_id) = seed_pending(&fx).await;

    let outcome = fx.reconciler.apply(&provider_id).await.unwrap();
    assert_eq!(outcome, ReconcileOutcome::StillPending);

    let registration =
      fx.store.get_registration(registration_id).await.unwrap().unwrap();
    assert_eq!(registration.status, RegistrationStatus::Pending);
    assert!(fx.blobs.names().is_empty());
  }

  #[tokio::test]
  async fn approved_charge_settles_everything() {
    let fx = fixture().await;
    let (registration_id, provider_id) = seed_pending(&fx).await;
    fx.gateway.approve(&provider_id);

    let outcome = fx.reconciler.apply(&provider_id).await.unwrap();
    assert_eq!(outcome, ReconcileOutcome::Settled);

    let registration =
      fx.store.get_registration(registration_id).await.unwrap().unwrap();
    assert_eq!(registration.status, RegistrationStatus::Paid);

    let payment =
      fx.store.payment_by_provider_id(&provider_id).await.unwrap().unwrap();
    assert_eq!(payment.status, PaymentStatus::Paid);

    let ledger = fx.store.ledger_rows(registration_id).await.unwrap();
    assert!(ledger.iter().all(|r| r.status == RegistrationStatus::Paid));

    let names = fx.blobs.names();
    assert_eq!(names, vec![format!("receipts/{registration_id}.html")]);

    let texts = fx.messenger.texts_to("5561999887766");
    assert!(texts.iter().any(|t| t.contains("comprovante")));
  }

  #[tokio::test]
  async fn replayed_webhook_is_a_noop() {
    let fx = fixture().await;
    let (_, provider_id) = seed_pending(&fx).await;
    fx.gateway.approve(&provider_id);

    assert_eq!(
      fx.reconciler.apply(&provider_id).await.unwrap(),
      ReconcileOutcome::Settled
    );
    assert_eq!(
      fx.reconciler.apply(&provider_id).await.unwrap(),
      ReconcileOutcome::AlreadyPaid
    );

    // One receipt, one confirmation.
    assert_eq!(fx.blobs.names().len(), 1);
    let texts = fx.messenger.texts_to("5561999887766");
    assert_eq!(texts.iter().filter(|t| t.contains("comprovante")).count(), 1);
  }

  #[tokio::test]
  async fn receipt_upload_failure_still_settles() {
    let fx = fixture().await;
    let (registration_id, provider_id) = seed_pending(&fx).await;
    fx.gateway.approve(&provider_id);
    fx.blobs.fail_puts();

    let outcome = fx.reconciler.apply(&provider_id).await.unwrap();
    assert_eq!(outcome, ReconcileOutcome::Settled);

    let registration =
      fx.store.get_registration(registration_id).await.unwrap().unwrap();
    assert_eq!(registration.status, RegistrationStatus::Paid);
  }
}
