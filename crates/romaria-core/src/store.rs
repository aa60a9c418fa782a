//! The `BotStore` trait — every read/write the engine performs.
//!
//! The trait is implemented by storage backends (e.g.
//! `romaria-store-sqlite`). Higher layers (`romaria-engine`,
//! `romaria-server`) depend on this abstraction, not on any concrete
//! backend. Reference entities (events, tiers, districts, churches) are
//! read-only to the engine; the seed methods exist for administration and
//! tests.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  event::{Church, District, Event, RateTier},
  payment::{NewPayment, Payment, PaymentStatus},
  registration::{
    LedgerRow, NewParticipant, NewRegistration, Participant, Registration,
    RegistrationStatus,
  },
  session::Session,
};

/// Abstraction over the bot's storage backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (tokio with `axum`).
pub trait BotStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Sessions ──────────────────────────────────────────────────────────

  /// Fetch the session row for a phone. `None` if this identity has never
  /// messaged before.
  fn get_session<'a>(
    &'a self,
    phone: &'a str,
  ) -> impl Future<Output = Result<Option<Session>, Self::Error>> + Send + 'a;

  /// Write the whole session row — state, context and dedup id together.
  /// Creates the row if absent (lazy creation on first inbound message).
  fn upsert_session(
    &self,
    session: Session,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Reference data (read-only to the engine) ──────────────────────────

  /// Events whose registration window contains `now`, ordered by name.
  fn list_open_events(
    &self,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<Vec<Event>, Self::Error>> + Send + '_;

  fn get_event(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Event>, Self::Error>> + Send + '_;

  /// The rate tier whose window contains `now` for this event, if any.
  fn active_rate_tier(
    &self,
    event_id: Uuid,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<Option<RateTier>, Self::Error>> + Send + '_;

  fn list_districts(
    &self,
  ) -> impl Future<Output = Result<Vec<District>, Self::Error>> + Send + '_;

  fn list_churches(
    &self,
    district_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Church>, Self::Error>> + Send + '_;

  /// Case-insensitive exact-name lookup, for free-text district input.
  fn find_district_by_name<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<Option<District>, Self::Error>> + Send + 'a;

  /// Case-insensitive exact-name lookup, optionally scoped to a district.
  fn find_church_by_name<'a>(
    &'a self,
    district_id: Option<Uuid>,
    name: &'a str,
  ) -> impl Future<Output = Result<Option<Church>, Self::Error>> + Send + 'a;

  // ── Registrations & participants ──────────────────────────────────────

  /// Persist a new registration with status `Pending`; the store assigns id
  /// and `created_at`.
  fn insert_registration(
    &self,
    input: NewRegistration,
  ) -> impl Future<Output = Result<Registration, Self::Error>> + Send + '_;

  fn get_registration(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Registration>, Self::Error>> + Send + '_;

  fn set_registration_status(
    &self,
    id: Uuid,
    status: RegistrationStatus,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn insert_participant(
    &self,
    input: NewParticipant,
  ) -> impl Future<Output = Result<Participant, Self::Error>> + Send + '_;

  fn participants_of(
    &self,
    registration_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Participant>, Self::Error>> + Send + '_;

  /// Whether this CPF is already registered for this event, across all
  /// registrations — the uniqueness invariant the collector enforces.
  fn cpf_registered<'a>(
    &'a self,
    event_id: Uuid,
    cpf: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Registrations that cover a participant with this CPF, newest first.
  fn registrations_for_cpf<'a>(
    &'a self,
    cpf: &'a str,
  ) -> impl Future<Output = Result<Vec<Registration>, Self::Error>> + Send + 'a;

  // ── Payments ──────────────────────────────────────────────────────────

  fn insert_payment(
    &self,
    input: NewPayment,
  ) -> impl Future<Output = Result<Payment, Self::Error>> + Send + '_;

  fn payment_by_provider_id<'a>(
    &'a self,
    provider_payment_id: &'a str,
  ) -> impl Future<Output = Result<Option<Payment>, Self::Error>> + Send + 'a;

  /// The most recent `Pending` payment whose registration covers this CPF.
  fn latest_pending_payment_for_cpf<'a>(
    &'a self,
    cpf: &'a str,
  ) -> impl Future<Output = Result<Option<Payment>, Self::Error>> + Send + 'a;

  fn set_payment_status(
    &self,
    id: Uuid,
    status: PaymentStatus,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Reporting ledger ──────────────────────────────────────────────────

  fn insert_ledger_row(
    &self,
    row: LedgerRow,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn ledger_rows(
    &self,
    registration_id: Uuid,
  ) -> impl Future<Output = Result<Vec<LedgerRow>, Self::Error>> + Send + '_;

  /// Flip every ledger row of a registration to `Paid`.
  fn mark_ledger_paid(
    &self,
    registration_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Reference data administration / seeding ───────────────────────────

  fn insert_event(
    &self,
    event: Event,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn insert_rate_tier(
    &self,
    tier: RateTier,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn insert_district(
    &self,
    district: District,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn insert_church(
    &self,
    church: Church,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
