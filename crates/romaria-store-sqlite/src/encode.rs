//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, dates are `YYYY-MM-DD`, money is the
//! exact decimal string, the session context is compact JSON, UUIDs are
//! hyphenated lowercase strings.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use romaria_core::{
  event::{Church, District, Event, RateTier},
  payment::{Payment, PaymentStatus},
  registration::{LedgerRow, Participant, Registration, RegistrationStatus},
  session::{FlowContext, Session, SessionState},
};

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> / NaiveDate ───────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Decimal ─────────────────────────────────────────────────────────────────

pub fn encode_decimal(d: Decimal) -> String { d.to_string() }

pub fn decode_decimal(s: &str) -> Result<Decimal> {
  s.parse().map_err(|_| Error::DecimalParse(s.to_string()))
}

// ─── Status enums ────────────────────────────────────────────────────────────

pub fn encode_session_state(s: SessionState) -> &'static str {
  match s {
    SessionState::Idle => "idle",
    SessionState::Menu => "menu",
    SessionState::SelectingEvent => "selecting_event",
    SessionState::Quantity => "quantity",
    SessionState::CollectingParticipant => "collecting_participant",
    SessionState::SelectingDistrict => "selecting_district",
    SessionState::SelectingChurch => "selecting_church",
    SessionState::ConsultingRegistration => "consulting_registration",
    SessionState::ConsultingPendingPayment => "consulting_pending_payment",
  }
}

pub fn decode_session_state(s: &str) -> Result<SessionState> {
  match s {
    "idle" => Ok(SessionState::Idle),
    "menu" => Ok(SessionState::Menu),
    "selecting_event" => Ok(SessionState::SelectingEvent),
    "quantity" => Ok(SessionState::Quantity),
    "collecting_participant" => Ok(SessionState::CollectingParticipant),
    "selecting_district" => Ok(SessionState::SelectingDistrict),
    "selecting_church" => Ok(SessionState::SelectingChurch),
    "consulting_registration" => Ok(SessionState::ConsultingRegistration),
    "consulting_pending_payment" => Ok(SessionState::ConsultingPendingPayment),
    other => Err(Error::UnknownEnumValue(other.to_string())),
  }
}

pub fn encode_registration_status(s: RegistrationStatus) -> &'static str {
  match s {
    RegistrationStatus::Pending => "pending",
    RegistrationStatus::Paid => "paid",
  }
}

pub fn decode_registration_status(s: &str) -> Result<RegistrationStatus> {
  match s {
    "pending" => Ok(RegistrationStatus::Pending),
    "paid" => Ok(RegistrationStatus::Paid),
    other => Err(Error::UnknownEnumValue(other.to_string())),
  }
}

pub fn encode_payment_status(s: PaymentStatus) -> &'static str {
  match s {
    PaymentStatus::Pending => "pending",
    PaymentStatus::Paid => "paid",
  }
}

pub fn decode_payment_status(s: &str) -> Result<PaymentStatus> {
  match s {
    "pending" => Ok(PaymentStatus::Pending),
    "paid" => Ok(PaymentStatus::Paid),
    other => Err(Error::UnknownEnumValue(other.to_string())),
  }
}

// ─── Session context ─────────────────────────────────────────────────────────

pub fn encode_context(ctx: &FlowContext) -> Result<String> {
  Ok(serde_json::to_string(ctx)?)
}

pub fn decode_context(s: &str) -> Result<FlowContext> {
  Ok(serde_json::from_str(s)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `sessions` row.
pub struct RawSession {
  pub phone:           String,
  pub state:           String,
  pub context:         String,
  pub last_message_id: Option<String>,
  pub updated_at:      String,
}

impl RawSession {
  pub fn into_session(self) -> Result<Session> {
    Ok(Session {
      phone:           self.phone,
      state:           decode_session_state(&self.state)?,
      context:         decode_context(&self.context)?,
      last_message_id: self.last_message_id,
      updated_at:      decode_dt(&self.updated_at)?,
    })
  }
}

pub struct RawEvent {
  pub event_id:  String,
  pub name:      String,
  pub opens_at:  String,
  pub closes_at: String,
}

impl RawEvent {
  pub fn into_event(self) -> Result<Event> {
    Ok(Event {
      id:        decode_uuid(&self.event_id)?,
      name:      self.name,
      opens_at:  decode_dt(&self.opens_at)?,
      closes_at: decode_dt(&self.closes_at)?,
    })
  }
}

pub struct RawRateTier {
  pub tier_id:   String,
  pub event_id:  String,
  pub name:      String,
  pub price:     String,
  pub starts_at: String,
  pub ends_at:   String,
}

impl RawRateTier {
  pub fn into_tier(self) -> Result<RateTier> {
    Ok(RateTier {
      id:        decode_uuid(&self.tier_id)?,
      event_id:  decode_uuid(&self.event_id)?,
      name:      self.name,
      price:     decode_decimal(&self.price)?,
      starts_at: decode_dt(&self.starts_at)?,
      ends_at:   decode_dt(&self.ends_at)?,
    })
  }
}

pub struct RawRegistration {
  pub registration_id: String,
  pub event_id:        String,
  pub contact_phone:   String,
  pub total:           String,
  pub status:          String,
  pub created_at:      String,
}

impl RawRegistration {
  pub fn into_registration(self) -> Result<Registration> {
    Ok(Registration {
      id:            decode_uuid(&self.registration_id)?,
      event_id:      decode_uuid(&self.event_id)?,
      contact_phone: self.contact_phone,
      total:         decode_decimal(&self.total)?,
      status:        decode_registration_status(&self.status)?,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

pub struct RawParticipant {
  pub participant_id:  String,
  pub registration_id: String,
  pub event_id:        String,
  pub name:            String,
  pub cpf:             String,
  pub birthdate:       Option<String>,
  pub gender:          Option<String>,
  pub district_id:     Option<String>,
  pub church_id:       Option<String>,
  pub phone:           Option<String>,
}

impl RawParticipant {
  pub fn into_participant(self) -> Result<Participant> {
    Ok(Participant {
      id:              decode_uuid(&self.participant_id)?,
      registration_id: decode_uuid(&self.registration_id)?,
      event_id:        decode_uuid(&self.event_id)?,
      name:            self.name,
      cpf:             self.cpf,
      birthdate:       self.birthdate.as_deref().map(decode_date).transpose()?,
      gender:          self.gender,
      district_id:     self.district_id.as_deref().map(decode_uuid).transpose()?,
      church_id:       self.church_id.as_deref().map(decode_uuid).transpose()?,
      phone:           self.phone,
    })
  }
}

pub struct RawPayment {
  pub payment_id:          String,
  pub registration_id:     String,
  pub provider:            String,
  pub provider_payment_id: String,
  pub status:              String,
  pub pix_code:            String,
  pub pix_qr_image:        Option<String>,
  pub expires_at:          Option<String>,
  pub created_at:          String,
}

impl RawPayment {
  pub fn into_payment(self) -> Result<Payment> {
    Ok(Payment {
      id:                  decode_uuid(&self.payment_id)?,
      registration_id:     decode_uuid(&self.registration_id)?,
      provider:            self.provider,
      provider_payment_id: self.provider_payment_id,
      status:              decode_payment_status(&self.status)?,
      pix_code:            self.pix_code,
      pix_qr_image:        self.pix_qr_image,
      expires_at:          self.expires_at.as_deref().map(decode_dt).transpose()?,
      created_at:          decode_dt(&self.created_at)?,
    })
  }
}

pub struct RawLedgerRow {
  pub ledger_id:        String,
  pub registration_id:  String,
  pub participant_id:   String,
  pub event_name:       String,
  pub participant_name: String,
  pub cpf:              String,
  pub district_name:    Option<String>,
  pub church_name:      Option<String>,
  pub total:            String,
  pub status:           String,
  pub created_at:       String,
}

impl RawLedgerRow {
  pub fn into_row(self) -> Result<LedgerRow> {
    Ok(LedgerRow {
      id:               decode_uuid(&self.ledger_id)?,
      registration_id:  decode_uuid(&self.registration_id)?,
      participant_id:   decode_uuid(&self.participant_id)?,
      event_name:       self.event_name,
      participant_name: self.participant_name,
      cpf:              self.cpf,
      district_name:    self.district_name,
      church_name:      self.church_name,
      total:            decode_decimal(&self.total)?,
      status:           decode_registration_status(&self.status)?,
      created_at:       decode_dt(&self.created_at)?,
    })
  }
}

pub struct RawDistrict {
  pub district_id: String,
  pub name:        String,
}

impl RawDistrict {
  pub fn into_district(self) -> Result<District> {
    Ok(District {
      id:   decode_uuid(&self.district_id)?,
      name: self.name,
    })
  }
}

pub struct RawChurch {
  pub church_id:   String,
  pub district_id: String,
  pub name:        String,
}

impl RawChurch {
  pub fn into_church(self) -> Result<Church> {
    Ok(Church {
      id:          decode_uuid(&self.church_id)?,
      district_id: decode_uuid(&self.district_id)?,
      name:        self.name,
    })
  }
}
