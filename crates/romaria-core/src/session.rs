//! The durable conversational state for one contact identity.
//!
//! One session row per normalized phone number, overwritten in place.
//! Sessions are created lazily on first inbound message and never deleted —
//! a finished or cancelled conversation is reset to `Idle` with an empty
//! context instead.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::registration::ParticipantDraft;

// ─── State ───────────────────────────────────────────────────────────────────

/// The finite states of the conversation machine. `Idle` is both the initial
/// state and the universal reset target; there is no terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
  #[default]
  Idle,
  Menu,
  SelectingEvent,
  Quantity,
  CollectingParticipant,
  SelectingDistrict,
  SelectingChurch,
  ConsultingRegistration,
  ConsultingPendingPayment,
}

// ─── Context ─────────────────────────────────────────────────────────────────

/// A numbered option shown to the user; the index into the stored list is the
/// number they reply with, minus one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListedOption {
  pub id:    Uuid,
  pub label: String,
}

/// In-progress collection data carried between messages.
///
/// Persisted as schema-free JSON in the session row; every field is
/// defaulted so a context written by an older build never breaks a
/// transition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowContext {
  pub event_id:         Option<Uuid>,
  pub event_name:       Option<String>,
  /// How many participants this registration covers (1..=50).
  pub quantity:         u32,
  /// 1-based slot currently being collected. Exceeding `quantity` triggers
  /// settlement.
  pub current_index:    u32,
  /// Completed drafts awaiting settlement.
  pub collected:        Vec<ParticipantDraft>,
  /// The draft in the middle of district/church disambiguation.
  pub pending:          Option<ParticipantDraft>,
  pub event_options:    Vec<ListedOption>,
  pub district_options: Vec<ListedOption>,
  pub church_options:   Vec<ListedOption>,
}

// ─── Session ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
  /// Normalized phone number — the identity key.
  pub phone:           String,
  pub state:           SessionState,
  pub context:         FlowContext,
  /// Provider-issued id of the last processed inbound message, for
  /// transport-level redelivery dedup.
  pub last_message_id: Option<String>,
  pub updated_at:      DateTime<Utc>,
}

impl Session {
  /// A fresh idle session for a phone seen for the first time.
  pub fn new(phone: impl Into<String>) -> Self {
    Self {
      phone:           phone.into(),
      state:           SessionState::Idle,
      context:         FlowContext::default(),
      last_message_id: None,
      updated_at:      Utc::now(),
    }
  }

  /// Hard reset: back to idle with an empty context. The row itself and the
  /// dedup id survive.
  pub fn reset(&mut self) {
    self.state = SessionState::Idle;
    self.context = FlowContext::default();
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn reset_keeps_identity_and_dedup_id() {
    let mut session = Session::new("5561999887766");
    session.state = SessionState::Quantity;
    session.context.quantity = 3;
    session.last_message_id = Some("wamid.1".to_string());

    session.reset();

    assert_eq!(session.state, SessionState::Idle);
    assert_eq!(session.context, FlowContext::default());
    assert_eq!(session.phone, "5561999887766");
    assert_eq!(session.last_message_id.as_deref(), Some("wamid.1"));
  }

  #[test]
  fn context_with_unknown_or_missing_keys_still_deserializes() {
    let ctx: FlowContext =
      serde_json::from_str(r#"{"quantity": 2, "someday_field": true}"#).unwrap();
    assert_eq!(ctx.quantity, 2);
    assert_eq!(ctx.current_index, 0);
    assert!(ctx.collected.is_empty());
  }
}
