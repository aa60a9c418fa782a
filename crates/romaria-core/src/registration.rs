//! Registrations, participants and the denormalized reporting ledger.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Registration ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationStatus {
  Pending,
  Paid,
}

/// One purchase covering one or more participants for one event.
///
/// Immutable after creation except for `status`, which only webhook
/// reconciliation flips to `Paid`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registration {
  pub id:            Uuid,
  pub event_id:      Uuid,
  pub contact_phone: String,
  /// `active_tier.price * participant_count`, computed once at creation and
  /// never recomputed, even if tiers change later.
  pub total:         Decimal,
  pub status:        RegistrationStatus,
  pub created_at:    DateTime<Utc>,
}

/// Input to [`crate::store::BotStore::insert_registration`].
/// `id`, `status` and `created_at` are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewRegistration {
  pub event_id:      Uuid,
  pub contact_phone: String,
  pub total:         Decimal,
}

// ─── Participant ─────────────────────────────────────────────────────────────

/// A person covered by a registration. `(event_id, cpf)` is unique across all
/// participants of all registrations for that event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
  pub id:              Uuid,
  pub registration_id: Uuid,
  pub event_id:        Uuid,
  pub name:            String,
  pub cpf:             String,
  pub birthdate:       Option<NaiveDate>,
  pub gender:          Option<String>,
  pub district_id:     Option<Uuid>,
  pub church_id:       Option<Uuid>,
  pub phone:           Option<String>,
}

/// Input to [`crate::store::BotStore::insert_participant`].
#[derive(Debug, Clone)]
pub struct NewParticipant {
  pub registration_id: Uuid,
  pub event_id:        Uuid,
  pub name:            String,
  pub cpf:             String,
  pub birthdate:       Option<NaiveDate>,
  pub gender:          Option<String>,
  pub district_id:     Option<Uuid>,
  pub church_id:       Option<Uuid>,
  pub phone:           Option<String>,
}

// ─── Draft ───────────────────────────────────────────────────────────────────

/// A participant record accumulated in the session context while the flow
/// collects it over several messages. Becomes a [`NewParticipant`] once the
/// batch is handed to the settlement pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticipantDraft {
  pub name:          Option<String>,
  pub cpf:           Option<String>,
  pub birthdate:     Option<NaiveDate>,
  pub gender:        Option<String>,
  pub phone:         Option<String>,
  /// Free-text district/church names, resolved against the reference tables
  /// either during disambiguation or at settlement time.
  pub district_name: Option<String>,
  pub church_name:   Option<String>,
  pub district_id:   Option<Uuid>,
  pub church_id:     Option<Uuid>,
}

impl ParticipantDraft {
  /// A draft is acceptable once name and CPF are present; the CPF's check
  /// digits are verified by the collector before this is consulted.
  pub fn is_complete(&self) -> bool {
    self.name.is_some() && self.cpf.is_some()
  }
}

// ─── Reporting ledger ────────────────────────────────────────────────────────

/// One denormalized row per participant in the reporting ledger, written at
/// creation time and flipped to paid on payment approval. Read by the admin
/// reporting surface, which is outside this codebase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerRow {
  pub id:               Uuid,
  pub registration_id:  Uuid,
  pub participant_id:   Uuid,
  pub event_name:       String,
  pub participant_name: String,
  pub cpf:              String,
  pub district_name:    Option<String>,
  pub church_name:      Option<String>,
  pub total:            Decimal,
  pub status:           RegistrationStatus,
  pub created_at:       DateTime<Utc>,
}
