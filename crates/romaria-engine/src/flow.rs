//! The conversation state machine.
//!
//! One [`FlowEngine::handle`] call per inbound message: load (or lazily
//! create) the session, drop transport redeliveries, classify the text,
//! run the transition for the current state, persist the session once and
//! only then deliver the queued replies. A crash before the persist leaves
//! the old session intact and the provider will redeliver.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};

use romaria_core::{
  Error, Result,
  gateway::{ChargeStatus, MenuOption, MessageSender, PaymentGateway},
  registration::ParticipantDraft,
  session::{ListedOption, Session, SessionState},
  store::BotStore,
  validate::{normalize_phone, valid_cpf},
};

use crate::{
  collect,
  intent::{self, Intent, PaymentAction},
  replies,
  settlement::SettlementPipeline,
};

/// At most this many options per numbered list; no pagination.
const MAX_LISTED_OPTIONS: usize = 20;

/// Participants per registration, inclusive.
const MAX_QUANTITY: u32 = 50;

/// One message as handed over by the webhook layer.
#[derive(Debug, Clone)]
pub struct InboundMessage {
  /// Provider-issued message id, used for redelivery dedup.
  pub id:   String,
  /// Sender phone in whatever format the provider uses.
  pub from: String,
  pub text: String,
}

enum Outbound {
  Text(String),
  Image { image_base64: String, caption: String },
  Menu { header: String, options: Vec<MenuOption> },
}

pub struct FlowEngine<S, M, P> {
  store:      Arc<S>,
  messenger:  Arc<M>,
  gateway:    Arc<P>,
  settlement: SettlementPipeline<S, M, P>,
}

impl<S, M, P> FlowEngine<S, M, P>
where
  S: BotStore,
  M: MessageSender,
  P: PaymentGateway,
{
  pub fn new(store: Arc<S>, messenger: Arc<M>, gateway: Arc<P>) -> Self {
    let settlement =
      SettlementPipeline::new(store.clone(), messenger.clone(), gateway.clone());
    Self { store, messenger, gateway, settlement }
  }

  /// Process one inbound message end to end.
  pub async fn handle(&self, msg: &InboundMessage) -> Result<()> {
    let phone = normalize_phone(&msg.from);

    let mut session = self
      .store
      .get_session(&phone)
      .await
      .map_err(Error::store)?
      .unwrap_or_else(|| Session::new(phone.clone()));

    if session.last_message_id.as_deref() == Some(msg.id.as_str()) {
      debug!(phone, message_id = %msg.id, "redelivered message dropped");
      return Ok(());
    }
    session.last_message_id = Some(msg.id.clone());

    let outbound = match intent::classify(&msg.text) {
      Intent::Cancel => {
        session.reset();
        vec![Outbound::Text(replies::CANCELLED.to_string())]
      }
      Intent::Support => vec![Outbound::Text(replies::SUPPORT_CONTACT.to_string())],
      Intent::Payment { action, cpf } => {
        self.payment_shortcut(&mut session, action, cpf).await?
      }
      Intent::StateInput => self.state_input(&mut session, &msg.text).await?,
    };

    session.updated_at = Utc::now();
    self
      .store
      .upsert_session(session)
      .await
      .map_err(Error::store)?;

    self.deliver(&phone, outbound).await;
    Ok(())
  }

  /// Delivery is best-effort once the session is persisted; the sender
  /// already retried, so a failure here is logged and swallowed.
  async fn deliver(&self, to: &str, outbound: Vec<Outbound>) {
    for reply in outbound {
      let result = match &reply {
        Outbound::Text(body) => self.messenger.send_text(to, body).await,
        Outbound::Image { image_base64, caption } => {
          self.messenger.send_image(to, image_base64, caption).await
        }
        Outbound::Menu { header, options } => {
          self.messenger.send_menu(to, header, options).await
        }
      };
      if let Err(e) = result {
        warn!(to, error = %e, "reply undeliverable");
      }
    }
  }

  // ─── Payment shortcuts ────────────────────────────────────────────────────

  async fn payment_shortcut(
    &self,
    session: &mut Session,
    action: PaymentAction,
    cpf: Option<String>,
  ) -> Result<Vec<Outbound>> {
    // Without an inline CPF we cannot look anything up; route through the
    // CPF prompt and come back as a pending-payment consultation.
    let Some(cpf) = cpf else {
      session.reset();
      session.state = SessionState::ConsultingPendingPayment;
      return Ok(vec![Outbound::Text(replies::ASK_CPF.to_string())]);
    };

    let payment = self
      .store
      .latest_pending_payment_for_cpf(&cpf)
      .await
      .map_err(Error::store)?;
    let Some(payment) = payment else {
      return Ok(vec![Outbound::Text(replies::NO_PENDING_PAYMENT.to_string())]);
    };

    Ok(match action {
      PaymentAction::CopyCode | PaymentAction::ConsultPending => {
        vec![Outbound::Text(replies::pending_payment(&payment))]
      }
      PaymentAction::ResendQr => match payment.pix_qr_image.clone() {
        Some(image_base64) => {
          vec![Outbound::Image { image_base64, caption: "PIX".to_string() }]
        }
        None => vec![Outbound::Text(replies::pending_payment(&payment))],
      },
      PaymentAction::ClaimPaid => {
        let charge = self
          .gateway
          .fetch_charge(&payment.provider_payment_id)
          .await
          .map_err(|e| Error::gateway(&payment.provider, e))?;
        if charge.status == ChargeStatus::Approved {
          vec![Outbound::Text(replies::CLAIM_CONFIRMED.to_string())]
        } else {
          vec![Outbound::Text(replies::CLAIM_NOT_FOUND.to_string())]
        }
      }
    })
  }

  // ─── State-scoped input ───────────────────────────────────────────────────

  async fn state_input(
    &self,
    session: &mut Session,
    text: &str,
  ) -> Result<Vec<Outbound>> {
    match session.state {
      SessionState::Idle => {
        session.state = SessionState::Menu;
        Ok(vec![Outbound::Menu {
          header:  replies::MENU_HEADER.to_string(),
          options: replies::menu_options(),
        }])
      }
      SessionState::Menu => self.on_menu(session, text).await,
      SessionState::SelectingEvent => self.on_event_choice(session, text).await,
      SessionState::Quantity => Ok(self.on_quantity(session, text)),
      SessionState::CollectingParticipant => {
        self.on_participant(session, text).await
      }
      SessionState::SelectingDistrict => self.on_district_choice(session, text).await,
      SessionState::SelectingChurch => self.on_church_choice(session, text).await,
      SessionState::ConsultingRegistration => self.on_consult(session, text).await,
      SessionState::ConsultingPendingPayment => {
        self.on_consult_pending(session, text).await
      }
    }
  }

  async fn on_menu(
    &self,
    session: &mut Session,
    text: &str,
  ) -> Result<Vec<Outbound>> {
    // Numbered replies and interactive option ids both arrive as text.
    match text.trim() {
      "1" | "register" => self.start_registration(session).await,
      "2" | "consult" => {
        session.state = SessionState::ConsultingRegistration;
        Ok(vec![Outbound::Text(replies::ASK_CPF.to_string())])
      }
      "3" | "pending" => {
        session.state = SessionState::ConsultingPendingPayment;
        Ok(vec![Outbound::Text(replies::ASK_CPF.to_string())])
      }
      "4" | "support" => {
        session.reset();
        Ok(vec![Outbound::Text(replies::SUPPORT_CONTACT.to_string())])
      }
      _ => Ok(vec![Outbound::Text(replies::MENU_RETRY.to_string())]),
    }
  }

  async fn start_registration(&self, session: &mut Session) -> Result<Vec<Outbound>> {
    let events = self
      .store
      .list_open_events(Utc::now())
      .await
      .map_err(Error::store)?;

    match events.len() {
      0 => {
        session.reset();
        Ok(vec![Outbound::Text(replies::NO_OPEN_EVENTS.to_string())])
      }
      // With a single open event there is nothing to choose.
      1 => {
        let event = &events[0];
        session.context.event_id = Some(event.id);
        session.context.event_name = Some(event.name.clone());
        session.state = SessionState::Quantity;
        Ok(vec![Outbound::Text(replies::ask_quantity(&event.name))])
      }
      _ => {
        let options: Vec<ListedOption> = events
          .iter()
          .take(MAX_LISTED_OPTIONS)
          .map(|e| ListedOption { id: e.id, label: e.name.clone() })
          .collect();
        let menu = replies::numbered_options(&options);
        session.context.event_options = options;
        session.state = SessionState::SelectingEvent;
        Ok(vec![Outbound::Menu {
          header:  replies::EVENT_LIST_HEADER.to_string(),
          options: menu,
        }])
      }
    }
  }

  async fn on_event_choice(
    &self,
    session: &mut Session,
    text: &str,
  ) -> Result<Vec<Outbound>> {
    let Some(option) = pick(&session.context.event_options, text) else {
      return Ok(vec![Outbound::Text(replies::EVENT_RETRY.to_string())]);
    };

    session.context.event_id = Some(option.id);
    session.context.event_name = Some(option.label.clone());
    let name = option.label.clone();
    session.context.event_options.clear();
    session.state = SessionState::Quantity;
    Ok(vec![Outbound::Text(replies::ask_quantity(&name))])
  }

  fn on_quantity(&self, session: &mut Session, text: &str) -> Vec<Outbound> {
    match text.trim().parse::<u32>() {
      Ok(n) if (1..=MAX_QUANTITY).contains(&n) => {
        session.context.quantity = n;
        session.context.current_index = 1;
        session.state = SessionState::CollectingParticipant;
        vec![Outbound::Text(replies::ask_participant(1, n))]
      }
      _ => vec![Outbound::Text(replies::QUANTITY_RETRY.to_string())],
    }
  }

  async fn on_participant(
    &self,
    session: &mut Session,
    text: &str,
  ) -> Result<Vec<Outbound>> {
    let base = session.context.pending.take().unwrap_or_default();
    let mut draft = collect::merge(base, collect::parse_draft(text));

    // The parser only guarantees 11 digits; verify the check digits here.
    if let Some(cpf) = draft.cpf.as_deref()
      && !valid_cpf(cpf)
    {
      draft.cpf = None;
    }

    if !draft.is_complete() {
      session.context.pending = Some(draft);
      return Ok(vec![Outbound::Text(replies::PARTICIPANT_RETRY.to_string())]);
    }

    let cpf = draft.cpf.clone().unwrap_or_default();
    if self.already_registered(session, &cpf).await? {
      let index = session.context.current_index;
      let mut out =
        vec![Outbound::Text(replies::duplicate_participant(&cpf, index))];
      out.extend(self.advance_slot(session).await?);
      return Ok(out);
    }

    self.resolve_or_disambiguate(session, draft).await
  }

  async fn already_registered(&self, session: &Session, cpf: &str) -> Result<bool> {
    if session
      .context
      .collected
      .iter()
      .any(|d| d.cpf.as_deref() == Some(cpf))
    {
      return Ok(true);
    }
    let Some(event_id) = session.context.event_id else {
      return Ok(false);
    };
    self
      .store
      .cpf_registered(event_id, cpf)
      .await
      .map_err(Error::store)
  }

  /// Try to resolve free-text district/church names directly; fall back to a
  /// numbered district list when the name doesn't match anything.
  async fn resolve_or_disambiguate(
    &self,
    session: &mut Session,
    mut draft: ParticipantDraft,
  ) -> Result<Vec<Outbound>> {
    let Some(district_name) = draft.district_name.clone() else {
      // No district offered: the record is done as-is.
      return self.complete_record(session, draft).await;
    };

    if let Some(district) = self
      .store
      .find_district_by_name(&district_name)
      .await
      .map_err(Error::store)?
    {
      draft.district_id = Some(district.id);
      if let Some(church_name) = draft.church_name.clone()
        && let Some(church) = self
          .store
          .find_church_by_name(Some(district.id), &church_name)
          .await
          .map_err(Error::store)?
      {
        draft.church_id = Some(church.id);
      }
      return self.complete_record(session, draft).await;
    }

    let districts = self.store.list_districts().await.map_err(Error::store)?;
    if districts.is_empty() {
      return self.complete_record(session, draft).await;
    }

    let options: Vec<ListedOption> = districts
      .into_iter()
      .take(MAX_LISTED_OPTIONS)
      .map(|d| ListedOption { id: d.id, label: d.name })
      .collect();
    let menu = replies::numbered_options(&options);
    session.context.district_options = options;
    session.context.pending = Some(draft);
    session.state = SessionState::SelectingDistrict;
    Ok(vec![Outbound::Menu {
      header:  replies::DISTRICT_HEADER.to_string(),
      options: menu,
    }])
  }

  async fn on_district_choice(
    &self,
    session: &mut Session,
    text: &str,
  ) -> Result<Vec<Outbound>> {
    let mut draft = session.context.pending.take().unwrap_or_default();

    if is_none_choice(text) {
      draft.district_name = None;
      draft.church_name = None;
      session.context.district_options.clear();
      return self.complete_record(session, draft).await;
    }

    let Some(option) = pick(&session.context.district_options, text) else {
      session.context.pending = Some(draft);
      return Ok(vec![Outbound::Text(replies::LIST_RETRY.to_string())]);
    };
    draft.district_id = Some(option.id);
    draft.district_name = Some(option.label.clone());
    let district_id = option.id;
    session.context.district_options.clear();

    let churches = self
      .store
      .list_churches(district_id)
      .await
      .map_err(Error::store)?;
    if churches.is_empty() {
      return self.complete_record(session, draft).await;
    }

    let options: Vec<ListedOption> = churches
      .into_iter()
      .take(MAX_LISTED_OPTIONS)
      .map(|c| ListedOption { id: c.id, label: c.name })
      .collect();
    let menu = replies::numbered_options(&options);
    session.context.church_options = options;
    session.context.pending = Some(draft);
    session.state = SessionState::SelectingChurch;
    Ok(vec![Outbound::Menu {
      header:  replies::CHURCH_HEADER.to_string(),
      options: menu,
    }])
  }

  async fn on_church_choice(
    &self,
    session: &mut Session,
    text: &str,
  ) -> Result<Vec<Outbound>> {
    let mut draft = session.context.pending.take().unwrap_or_default();

    if is_none_choice(text) {
      draft.church_name = None;
      session.context.church_options.clear();
      return self.complete_record(session, draft).await;
    }

    let Some(option) = pick(&session.context.church_options, text) else {
      session.context.pending = Some(draft);
      return Ok(vec![Outbound::Text(replies::LIST_RETRY.to_string())]);
    };
    draft.church_id = Some(option.id);
    draft.church_name = Some(option.label.clone());
    session.context.church_options.clear();
    self.complete_record(session, draft).await
  }

  async fn complete_record(
    &self,
    session: &mut Session,
    draft: ParticipantDraft,
  ) -> Result<Vec<Outbound>> {
    session.context.collected.push(draft);
    session.context.pending = None;
    session.state = SessionState::CollectingParticipant;
    self.advance_slot(session).await
  }

  /// Move to the next participant slot, or settle when the batch is full.
  async fn advance_slot(&self, session: &mut Session) -> Result<Vec<Outbound>> {
    session.context.current_index += 1;
    let index = session.context.current_index;
    let quantity = session.context.quantity;
    if index <= quantity {
      return Ok(vec![Outbound::Text(replies::ask_participant(index, quantity))]);
    }
    self.settle(session).await
  }

  /// Hand the collected batch to the settlement pipeline. Whatever the
  /// outcome, the conversation is over and the session resets.
  async fn settle(&self, session: &mut Session) -> Result<Vec<Outbound>> {
    let drafts = std::mem::take(&mut session.context.collected);
    let event_id = session.context.event_id;
    let phone = session.phone.clone();
    session.reset();

    if drafts.is_empty() {
      return Ok(vec![Outbound::Text(replies::ALL_DUPLICATES.to_string())]);
    }
    let event_id = event_id.ok_or_else(|| {
      Error::Validation("collection finished without a selected event".into())
    })?;
    let event = self
      .store
      .get_event(event_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::EventNotFound(event_id))?;

    match self.settlement.run(&event, &phone, &drafts).await {
      // The pipeline delivered the PIX messages itself.
      Ok(_) => Ok(Vec::new()),
      Err(Error::NoActiveRateTier(_)) => {
        Ok(vec![Outbound::Text(replies::NO_ACTIVE_TIER.to_string())])
      }
      Err(e) => {
        warn!(phone, error = %e, "settlement failed");
        Ok(vec![Outbound::Text(replies::SETTLEMENT_FAILED.to_string())])
      }
    }
  }

  // ─── Consultations ────────────────────────────────────────────────────────

  async fn on_consult(
    &self,
    session: &mut Session,
    text: &str,
  ) -> Result<Vec<Outbound>> {
    let Some(cpf) = intent::extract_cpf(&text.to_lowercase()) else {
      return Ok(vec![Outbound::Text(replies::CPF_RETRY.to_string())]);
    };

    let registrations = self
      .store
      .registrations_for_cpf(&cpf)
      .await
      .map_err(Error::store)?;
    session.reset();

    if registrations.is_empty() {
      return Ok(vec![Outbound::Text(replies::NO_REGISTRATION_FOUND.to_string())]);
    }

    let mut lines = Vec::with_capacity(registrations.len());
    for registration in &registrations {
      let event = self
        .store
        .get_event(registration.event_id)
        .await
        .map_err(Error::store)?;
      lines.push(replies::registration_summary(registration, event.as_ref()));
    }
    Ok(vec![Outbound::Text(lines.join("\n"))])
  }

  async fn on_consult_pending(
    &self,
    session: &mut Session,
    text: &str,
  ) -> Result<Vec<Outbound>> {
    let Some(cpf) = intent::extract_cpf(&text.to_lowercase()) else {
      return Ok(vec![Outbound::Text(replies::CPF_RETRY.to_string())]);
    };

    let payment = self
      .store
      .latest_pending_payment_for_cpf(&cpf)
      .await
      .map_err(Error::store)?;
    session.reset();

    Ok(match payment {
      Some(payment) => vec![Outbound::Text(replies::pending_payment(&payment))],
      None => vec![Outbound::Text(replies::NO_PENDING_PAYMENT.to_string())],
    })
  }
}

/// Resolve a numbered reply against a stored option list.
fn pick<'a>(options: &'a [ListedOption], text: &str) -> Option<&'a ListedOption> {
  let n: usize = text.trim().parse().ok()?;
  (1..=options.len()).contains(&n).then(|| &options[n - 1])
}

/// "0" declines the whole list.
fn is_none_choice(text: &str) -> bool {
  text.trim() == "0"
}
