//! The registration & settlement pipeline.
//!
//! Sequential, compensatable steps: resolve the active rate tier, create the
//! registration, insert participants, create the PIX charge, persist the
//! payment, deliver the charge. A failed step aborts forward progress in
//! this request but never reverts what earlier steps persisted — recovery is
//! a support follow-up, not a rollback.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{info, warn};
use uuid::Uuid;

use romaria_core::{
  Error, Result,
  event::Event,
  gateway::{Charge, ChargeRequest, ChargeStatus, MessageSender, PaymentGateway},
  payment::{NewPayment, Payment, PaymentStatus},
  registration::{
    LedgerRow, NewParticipant, NewRegistration, ParticipantDraft, Registration,
    RegistrationStatus,
  },
  store::BotStore,
};

use crate::replies;

/// What the pipeline managed to persist.
#[derive(Debug)]
pub struct SettlementOutcome {
  pub registration: Registration,
  pub payment:      Payment,
  /// CPFs skipped because a concurrent submission won the uniqueness race
  /// between the flow's check and our insert.
  pub skipped:      Vec<String>,
}

pub struct SettlementPipeline<S, M, P> {
  store:     Arc<S>,
  messenger: Arc<M>,
  gateway:   Arc<P>,
}

impl<S, M, P> SettlementPipeline<S, M, P>
where
  S: BotStore,
  M: MessageSender,
  P: PaymentGateway,
{
  pub fn new(store: Arc<S>, messenger: Arc<M>, gateway: Arc<P>) -> Self {
    Self { store, messenger, gateway }
  }

  /// Run the pipeline for a validated batch of 1..=50 drafts.
  ///
  /// The total is `active_tier.price * drafts.len()`, fixed here and never
  /// recomputed — a draft later skipped over a uniqueness race does not
  /// reduce the charge (the quote was locked when the batch was submitted).
  pub async fn run(
    &self,
    event:         &Event,
    contact_phone: &str,
    drafts:        &[ParticipantDraft],
  ) -> Result<SettlementOutcome> {
    // Step 1: price resolution. Nothing is created when no tier is active.
    let tier = self
      .store
      .active_rate_tier(event.id, Utc::now())
      .await
      .map_err(Error::store)?
      .ok_or(Error::NoActiveRateTier(event.id))?;

    // Step 2: registration row with the locked total.
    let total = tier.price * Decimal::from(drafts.len() as u64);
    let registration = self
      .store
      .insert_registration(NewRegistration {
        event_id:      event.id,
        contact_phone: contact_phone.to_string(),
        total,
      })
      .await
      .map_err(Error::store)?;

    info!(
      registration_id = %registration.id,
      event = %event.name,
      tier = %tier.name,
      participants = drafts.len(),
      total = %total,
      "registration created"
    );

    // Step 3: participant rows. A uniqueness race aborts the remaining
    // inserts; rows already written stay, and the registration remains
    // addressable for support follow-up.
    let skipped = self.insert_participants(&registration, event, drafts).await?;

    // Step 4: the PIX charge, idempotent on the registration id.
    let payer = &drafts[0];
    let request = ChargeRequest {
      amount:          total,
      description:     format!("Inscrição — {}", event.name),
      payer_name:      payer.name.clone().unwrap_or_default(),
      payer_cpf:       payer.cpf.clone().unwrap_or_default(),
      idempotency_key: registration.id.to_string(),
    };
    let charge = match self.gateway.create_charge(&request).await {
      Ok(charge) => charge,
      Err(e) => {
        warn!(registration_id = %registration.id, error = %e, "charge creation failed");
        return Err(Error::gateway("payment", e));
      }
    };

    // Step 5: local payment row mirroring the gateway's immediate answer.
    let payment = self.persist_payment(&registration, &charge).await?;

    self.deliver_charge(contact_phone, &registration, &payment).await;

    Ok(SettlementOutcome { registration, payment, skipped })
  }

  async fn insert_participants(
    &self,
    registration: &Registration,
    event:        &Event,
    drafts:       &[ParticipantDraft],
  ) -> Result<Vec<String>> {
    let mut skipped = Vec::new();

    for draft in drafts {
      let (district_id, district_name, church_id, church_name) =
        self.resolve_placement(draft).await?;

      let input = NewParticipant {
        registration_id: registration.id,
        event_id:        event.id,
        name:            draft.name.clone().unwrap_or_default(),
        cpf:             draft.cpf.clone().unwrap_or_default(),
        birthdate:       draft.birthdate,
        gender:          draft.gender.clone(),
        district_id,
        church_id,
        phone:           draft.phone.clone(),
      };
      let cpf = input.cpf.clone();

      match self.store.insert_participant(input).await {
        Ok(participant) => {
          self
            .store
            .insert_ledger_row(LedgerRow {
              id:               Uuid::new_v4(),
              registration_id:  registration.id,
              participant_id:   participant.id,
              event_name:       event.name.clone(),
              participant_name: participant.name.clone(),
              cpf:              participant.cpf.clone(),
              district_name,
              church_name,
              total:            registration.total,
              status:           RegistrationStatus::Pending,
              created_at:       Utc::now(),
            })
            .await
            .map_err(Error::store)?;
        }
        Err(e) => {
          // Treat any insert failure here as the late uniqueness race: stop
          // inserting, keep what exists.
          warn!(
            registration_id = %registration.id,
            error = %e,
            "participant insert aborted; keeping rows already written"
          );
          skipped.push(cpf);
          break;
        }
      }
    }

    Ok(skipped)
  }

  /// Resolve free-text district/church names left over from collection into
  /// ids; unknown names stay as names in the ledger only.
  async fn resolve_placement(
    &self,
    draft: &ParticipantDraft,
  ) -> Result<(Option<Uuid>, Option<String>, Option<Uuid>, Option<String>)> {
    let mut district_id = draft.district_id;
    if district_id.is_none()
      && let Some(name) = draft.district_name.as_deref()
    {
      district_id = self
        .store
        .find_district_by_name(name)
        .await
        .map_err(Error::store)?
        .map(|d| d.id);
    }

    let mut church_id = draft.church_id;
    if church_id.is_none()
      && let Some(name) = draft.church_name.as_deref()
    {
      church_id = self
        .store
        .find_church_by_name(district_id, name)
        .await
        .map_err(Error::store)?
        .map(|c| c.id);
    }

    Ok((
      district_id,
      draft.district_name.clone(),
      church_id,
      draft.church_name.clone(),
    ))
  }

  async fn persist_payment(
    &self,
    registration: &Registration,
    charge:       &Charge,
  ) -> Result<Payment> {
    let status = match charge.status {
      ChargeStatus::Approved => PaymentStatus::Paid,
      _ => PaymentStatus::Pending,
    };

    self
      .store
      .insert_payment(NewPayment {
        registration_id:     registration.id,
        provider:            charge.provider.clone(),
        provider_payment_id: charge.provider_payment_id.clone(),
        status,
        pix_code:            charge.pix_code.clone(),
        pix_qr_image:        charge.pix_qr_image.clone(),
        expires_at:          charge.expires_at,
      })
      .await
      .map_err(Error::store)
  }

  /// Best-effort delivery of the PIX code. The payment is already persisted;
  /// an undeliverable message is logged, and the user can recover it with
  /// the "pix" shortcut at any time.
  async fn deliver_charge(
    &self,
    to:           &str,
    registration: &Registration,
    payment:      &Payment,
  ) {
    let body = replies::pix_issued(registration, payment);
    if let Err(e) = self.messenger.send_text(to, &body).await {
      warn!(registration_id = %registration.id, error = %e, "pix text undeliverable");
      return;
    }

    if let Some(qr) = payment.pix_qr_image.as_deref()
      && let Err(e) = self.messenger.send_image(to, qr, "PIX").await
    {
      warn!(registration_id = %registration.id, error = %e, "pix qr undeliverable");
    }

    let options = replies::after_pix_options();
    if let Err(e) = self
      .messenger
      .send_menu(to, replies::AFTER_PIX_HEADER, &options)
      .await
    {
      warn!(registration_id = %registration.id, error = %e, "after-pix menu undeliverable");
    }
  }
}
