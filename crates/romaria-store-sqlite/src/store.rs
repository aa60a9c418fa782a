//! [`SqliteStore`] — the SQLite implementation of [`BotStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use romaria_core::{
  event::{Church, District, Event, RateTier},
  payment::{NewPayment, Payment, PaymentStatus},
  registration::{
    LedgerRow, NewParticipant, NewRegistration, Participant, Registration,
    RegistrationStatus,
  },
  session::Session,
  store::BotStore,
};

use crate::{
  encode::{
    RawChurch, RawDistrict, RawEvent, RawLedgerRow, RawParticipant, RawPayment,
    RawRateTier, RawRegistration, RawSession, encode_context, encode_date,
    encode_decimal, encode_dt, encode_payment_status,
    encode_registration_status, encode_session_state, encode_uuid,
  },
  schema::SCHEMA,
  Error, Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Romaria bot store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

fn is_constraint_violation(err: &tokio_rusqlite::Error) -> bool {
  matches!(
    err,
    tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(f, _))
      if f.code == rusqlite::ErrorCode::ConstraintViolation
  )
}

// ─── BotStore impl ───────────────────────────────────────────────────────────

impl BotStore for SqliteStore {
  type Error = Error;

  // ── Sessions ──────────────────────────────────────────────────────────────

  async fn get_session(&self, phone: &str) -> Result<Option<Session>> {
    let phone = phone.to_owned();

    let raw: Option<RawSession> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT phone, state, context, last_message_id, updated_at
             FROM sessions WHERE phone = ?1",
            rusqlite::params![phone],
            |row| {
              Ok(RawSession {
                phone:           row.get(0)?,
                state:           row.get(1)?,
                context:         row.get(2)?,
                last_message_id: row.get(3)?,
                updated_at:      row.get(4)?,
              })
            },
          )
          .optional()?)
      })
      .await?;

    raw.map(RawSession::into_session).transpose()
  }

  async fn upsert_session(&self, session: Session) -> Result<()> {
    let state_str   = encode_session_state(session.state).to_owned();
    let context_str = encode_context(&session.context)?;
    let at_str      = encode_dt(Utc::now());
    let phone       = session.phone;
    let last_id     = session.last_message_id;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO sessions (phone, state, context, last_message_id, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?5)
           ON CONFLICT (phone) DO UPDATE SET
             state = excluded.state,
             context = excluded.context,
             last_message_id = excluded.last_message_id,
             updated_at = excluded.updated_at",
          rusqlite::params![phone, state_str, context_str, last_id, at_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Reference data ────────────────────────────────────────────────────────

  async fn list_open_events(&self, now: DateTime<Utc>) -> Result<Vec<Event>> {
    let now_str = encode_dt(now);

    let raws: Vec<RawEvent> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT event_id, name, opens_at, closes_at FROM events
           WHERE opens_at <= ?1 AND ?1 < closes_at
           ORDER BY name",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![now_str], |row| {
            Ok(RawEvent {
              event_id:  row.get(0)?,
              name:      row.get(1)?,
              opens_at:  row.get(2)?,
              closes_at: row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawEvent::into_event).collect()
  }

  async fn get_event(&self, id: Uuid) -> Result<Option<Event>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawEvent> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT event_id, name, opens_at, closes_at FROM events
             WHERE event_id = ?1",
            rusqlite::params![id_str],
            |row| {
              Ok(RawEvent {
                event_id:  row.get(0)?,
                name:      row.get(1)?,
                opens_at:  row.get(2)?,
                closes_at: row.get(3)?,
              })
            },
          )
          .optional()?)
      })
      .await?;

    raw.map(RawEvent::into_event).transpose()
  }

  async fn active_rate_tier(
    &self,
    event_id: Uuid,
    now:      DateTime<Utc>,
  ) -> Result<Option<RateTier>> {
    let event_str = encode_uuid(event_id);
    let now_str   = encode_dt(now);

    let raw: Option<RawRateTier> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT tier_id, event_id, name, price, starts_at, ends_at
             FROM rate_tiers
             WHERE event_id = ?1 AND starts_at <= ?2 AND ?2 < ends_at
             ORDER BY starts_at DESC
             LIMIT 1",
            rusqlite::params![event_str, now_str],
            |row| {
              Ok(RawRateTier {
                tier_id:   row.get(0)?,
                event_id:  row.get(1)?,
                name:      row.get(2)?,
                price:     row.get(3)?,
                starts_at: row.get(4)?,
                ends_at:   row.get(5)?,
              })
            },
          )
          .optional()?)
      })
      .await?;

    raw.map(RawRateTier::into_tier).transpose()
  }

  async fn list_districts(&self) -> Result<Vec<District>> {
    let raws: Vec<RawDistrict> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare("SELECT district_id, name FROM districts ORDER BY name")?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawDistrict { district_id: row.get(0)?, name: row.get(1)? })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawDistrict::into_district).collect()
  }

  async fn list_churches(&self, district_id: Uuid) -> Result<Vec<Church>> {
    let district_str = encode_uuid(district_id);

    let raws: Vec<RawChurch> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT church_id, district_id, name FROM churches
           WHERE district_id = ?1 ORDER BY name",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![district_str], |row| {
            Ok(RawChurch {
              church_id:   row.get(0)?,
              district_id: row.get(1)?,
              name:        row.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawChurch::into_church).collect()
  }

  async fn find_district_by_name(&self, name: &str) -> Result<Option<District>> {
    let name = name.trim().to_owned();

    let raw: Option<RawDistrict> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT district_id, name FROM districts
             WHERE name = ?1 COLLATE NOCASE",
            rusqlite::params![name],
            |row| {
              Ok(RawDistrict { district_id: row.get(0)?, name: row.get(1)? })
            },
          )
          .optional()?)
      })
      .await?;

    raw.map(RawDistrict::into_district).transpose()
  }

  async fn find_church_by_name(
    &self,
    district_id: Option<Uuid>,
    name:        &str,
  ) -> Result<Option<Church>> {
    let district_str = district_id.map(encode_uuid);
    let name         = name.trim().to_owned();

    let raw: Option<RawChurch> = self
      .conn
      .call(move |conn| {
        let row = if let Some(d) = district_str {
          conn
            .query_row(
              "SELECT church_id, district_id, name FROM churches
               WHERE district_id = ?1 AND name = ?2 COLLATE NOCASE",
              rusqlite::params![d, name],
              |row| {
                Ok(RawChurch {
                  church_id:   row.get(0)?,
                  district_id: row.get(1)?,
                  name:        row.get(2)?,
                })
              },
            )
            .optional()?
        } else {
          conn
            .query_row(
              "SELECT church_id, district_id, name FROM churches
               WHERE name = ?1 COLLATE NOCASE",
              rusqlite::params![name],
              |row| {
                Ok(RawChurch {
                  church_id:   row.get(0)?,
                  district_id: row.get(1)?,
                  name:        row.get(2)?,
                })
              },
            )
            .optional()?
        };
        Ok(row)
      })
      .await?;

    raw.map(RawChurch::into_church).transpose()
  }

  // ── Registrations & participants ──────────────────────────────────────────

  async fn insert_registration(
    &self,
    input: NewRegistration,
  ) -> Result<Registration> {
    let registration = Registration {
      id:            Uuid::new_v4(),
      event_id:      input.event_id,
      contact_phone: input.contact_phone,
      total:         input.total,
      status:        RegistrationStatus::Pending,
      created_at:    Utc::now(),
    };

    let id_str     = encode_uuid(registration.id);
    let event_str  = encode_uuid(registration.event_id);
    let phone      = registration.contact_phone.clone();
    let total_str  = encode_decimal(registration.total);
    let status_str = encode_registration_status(registration.status).to_owned();
    let at_str     = encode_dt(registration.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO registrations
             (registration_id, event_id, contact_phone, total, status, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![id_str, event_str, phone, total_str, status_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(registration)
  }

  async fn get_registration(&self, id: Uuid) -> Result<Option<Registration>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawRegistration> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT registration_id, event_id, contact_phone, total, status, created_at
             FROM registrations WHERE registration_id = ?1",
            rusqlite::params![id_str],
            |row| {
              Ok(RawRegistration {
                registration_id: row.get(0)?,
                event_id:        row.get(1)?,
                contact_phone:   row.get(2)?,
                total:           row.get(3)?,
                status:          row.get(4)?,
                created_at:      row.get(5)?,
              })
            },
          )
          .optional()?)
      })
      .await?;

    raw.map(RawRegistration::into_registration).transpose()
  }

  async fn set_registration_status(
    &self,
    id:     Uuid,
    status: RegistrationStatus,
  ) -> Result<()> {
    let id_str     = encode_uuid(id);
    let status_str = encode_registration_status(status).to_owned();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE registrations SET status = ?2 WHERE registration_id = ?1",
          rusqlite::params![id_str, status_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn insert_participant(&self, input: NewParticipant) -> Result<Participant> {
    let participant = Participant {
      id:              Uuid::new_v4(),
      registration_id: input.registration_id,
      event_id:        input.event_id,
      name:            input.name,
      cpf:             input.cpf,
      birthdate:       input.birthdate,
      gender:          input.gender,
      district_id:     input.district_id,
      church_id:       input.church_id,
      phone:           input.phone,
    };

    let id_str       = encode_uuid(participant.id);
    let reg_str      = encode_uuid(participant.registration_id);
    let event_str    = encode_uuid(participant.event_id);
    let name         = participant.name.clone();
    let cpf          = participant.cpf.clone();
    let birth_str    = participant.birthdate.map(encode_date);
    let gender       = participant.gender.clone();
    let district_str = participant.district_id.map(encode_uuid);
    let church_str   = participant.church_id.map(encode_uuid);
    let phone        = participant.phone.clone();

    let outcome = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO participants
             (participant_id, registration_id, event_id, name, cpf,
              birthdate, gender, district_id, church_id, phone)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
          rusqlite::params![
            id_str, reg_str, event_str, name, cpf,
            birth_str, gender, district_str, church_str, phone,
          ],
        )?;
        Ok(())
      })
      .await;

    match outcome {
      Ok(()) => Ok(participant),
      Err(e) if is_constraint_violation(&e) => Err(Error::DuplicateCpf {
        event_id: participant.event_id,
        cpf:      participant.cpf,
      }),
      Err(e) => Err(e.into()),
    }
  }

  async fn participants_of(&self, registration_id: Uuid) -> Result<Vec<Participant>> {
    let reg_str = encode_uuid(registration_id);

    let raws: Vec<RawParticipant> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT participant_id, registration_id, event_id, name, cpf,
                  birthdate, gender, district_id, church_id, phone
           FROM participants WHERE registration_id = ?1",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![reg_str], |row| {
            Ok(RawParticipant {
              participant_id:  row.get(0)?,
              registration_id: row.get(1)?,
              event_id:        row.get(2)?,
              name:            row.get(3)?,
              cpf:             row.get(4)?,
              birthdate:       row.get(5)?,
              gender:          row.get(6)?,
              district_id:     row.get(7)?,
              church_id:       row.get(8)?,
              phone:           row.get(9)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawParticipant::into_participant).collect()
  }

  async fn cpf_registered(&self, event_id: Uuid, cpf: &str) -> Result<bool> {
    let event_str = encode_uuid(event_id);
    let cpf       = cpf.to_owned();

    let exists: bool = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT 1 FROM participants WHERE event_id = ?1 AND cpf = ?2",
            rusqlite::params![event_str, cpf],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false))
      })
      .await?;

    Ok(exists)
  }

  async fn registrations_for_cpf(&self, cpf: &str) -> Result<Vec<Registration>> {
    let cpf = cpf.to_owned();

    let raws: Vec<RawRegistration> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT r.registration_id, r.event_id, r.contact_phone, r.total,
                  r.status, r.created_at
           FROM registrations r
           JOIN participants p ON p.registration_id = r.registration_id
           WHERE p.cpf = ?1
           ORDER BY r.created_at DESC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![cpf], |row| {
            Ok(RawRegistration {
              registration_id: row.get(0)?,
              event_id:        row.get(1)?,
              contact_phone:   row.get(2)?,
              total:           row.get(3)?,
              status:          row.get(4)?,
              created_at:      row.get(5)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(RawRegistration::into_registration)
      .collect()
  }

  // ── Payments ──────────────────────────────────────────────────────────────

  async fn insert_payment(&self, input: NewPayment) -> Result<Payment> {
    let payment = Payment {
      id:                  Uuid::new_v4(),
      registration_id:     input.registration_id,
      provider:            input.provider,
      provider_payment_id: input.provider_payment_id,
      status:              input.status,
      pix_code:            input.pix_code,
      pix_qr_image:        input.pix_qr_image,
      expires_at:          input.expires_at,
      created_at:          Utc::now(),
    };

    let id_str       = encode_uuid(payment.id);
    let reg_str      = encode_uuid(payment.registration_id);
    let provider     = payment.provider.clone();
    let provider_id  = payment.provider_payment_id.clone();
    let status_str   = encode_payment_status(payment.status).to_owned();
    let pix_code     = payment.pix_code.clone();
    let pix_qr       = payment.pix_qr_image.clone();
    let expires_str  = payment.expires_at.map(encode_dt);
    let created_str  = encode_dt(payment.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO payments
             (payment_id, registration_id, provider, provider_payment_id,
              status, pix_code, pix_qr_image, expires_at, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
          rusqlite::params![
            id_str, reg_str, provider, provider_id,
            status_str, pix_code, pix_qr, expires_str, created_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(payment)
  }

  async fn payment_by_provider_id(
    &self,
    provider_payment_id: &str,
  ) -> Result<Option<Payment>> {
    let provider_id = provider_payment_id.to_owned();

    let raw: Option<RawPayment> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT payment_id, registration_id, provider, provider_payment_id,
                    status, pix_code, pix_qr_image, expires_at, created_at
             FROM payments WHERE provider_payment_id = ?1",
            rusqlite::params![provider_id],
            |row| {
              Ok(RawPayment {
                payment_id:          row.get(0)?,
                registration_id:     row.get(1)?,
                provider:            row.get(2)?,
                provider_payment_id: row.get(3)?,
                status:              row.get(4)?,
                pix_code:            row.get(5)?,
                pix_qr_image:        row.get(6)?,
                expires_at:          row.get(7)?,
                created_at:          row.get(8)?,
              })
            },
          )
          .optional()?)
      })
      .await?;

    raw.map(RawPayment::into_payment).transpose()
  }

  async fn latest_pending_payment_for_cpf(&self, cpf: &str) -> Result<Option<Payment>> {
    let cpf = cpf.to_owned();

    let raw: Option<RawPayment> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT pm.payment_id, pm.registration_id, pm.provider,
                    pm.provider_payment_id, pm.status, pm.pix_code,
                    pm.pix_qr_image, pm.expires_at, pm.created_at
             FROM payments pm
             JOIN participants p ON p.registration_id = pm.registration_id
             WHERE p.cpf = ?1 AND pm.status = 'pending'
             ORDER BY pm.created_at DESC
             LIMIT 1",
            rusqlite::params![cpf],
            |row| {
              Ok(RawPayment {
                payment_id:          row.get(0)?,
                registration_id:     row.get(1)?,
                provider:            row.get(2)?,
                provider_payment_id: row.get(3)?,
                status:              row.get(4)?,
                pix_code:            row.get(5)?,
                pix_qr_image:        row.get(6)?,
                expires_at:          row.get(7)?,
                created_at:          row.get(8)?,
              })
            },
          )
          .optional()?)
      })
      .await?;

    raw.map(RawPayment::into_payment).transpose()
  }

  async fn set_payment_status(&self, id: Uuid, status: PaymentStatus) -> Result<()> {
    let id_str     = encode_uuid(id);
    let status_str = encode_payment_status(status).to_owned();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE payments SET status = ?2 WHERE payment_id = ?1",
          rusqlite::params![id_str, status_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Reporting ledger ──────────────────────────────────────────────────────

  async fn insert_ledger_row(&self, row: LedgerRow) -> Result<()> {
    let id_str        = encode_uuid(row.id);
    let reg_str       = encode_uuid(row.registration_id);
    let part_str      = encode_uuid(row.participant_id);
    let event_name    = row.event_name;
    let part_name     = row.participant_name;
    let cpf           = row.cpf;
    let district_name = row.district_name;
    let church_name   = row.church_name;
    let total_str     = encode_decimal(row.total);
    let status_str    = encode_registration_status(row.status).to_owned();
    let at_str        = encode_dt(row.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO ledger
             (ledger_id, registration_id, participant_id, event_name,
              participant_name, cpf, district_name, church_name,
              total, status, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
          rusqlite::params![
            id_str, reg_str, part_str, event_name,
            part_name, cpf, district_name, church_name,
            total_str, status_str, at_str,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn ledger_rows(&self, registration_id: Uuid) -> Result<Vec<LedgerRow>> {
    let reg_str = encode_uuid(registration_id);

    let raws: Vec<RawLedgerRow> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT ledger_id, registration_id, participant_id, event_name,
                  participant_name, cpf, district_name, church_name,
                  total, status, created_at
           FROM ledger WHERE registration_id = ?1",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![reg_str], |row| {
            Ok(RawLedgerRow {
              ledger_id:        row.get(0)?,
              registration_id:  row.get(1)?,
              participant_id:   row.get(2)?,
              event_name:       row.get(3)?,
              participant_name: row.get(4)?,
              cpf:              row.get(5)?,
              district_name:    row.get(6)?,
              church_name:      row.get(7)?,
              total:            row.get(8)?,
              status:           row.get(9)?,
              created_at:       row.get(10)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawLedgerRow::into_row).collect()
  }

  async fn mark_ledger_paid(&self, registration_id: Uuid) -> Result<()> {
    let reg_str = encode_uuid(registration_id);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE ledger SET status = 'paid' WHERE registration_id = ?1",
          rusqlite::params![reg_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Reference data administration / seeding ───────────────────────────────

  async fn insert_event(&self, event: Event) -> Result<()> {
    let id_str     = encode_uuid(event.id);
    let name       = event.name;
    let opens_str  = encode_dt(event.opens_at);
    let closes_str = encode_dt(event.closes_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO events (event_id, name, opens_at, closes_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, name, opens_str, closes_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn insert_rate_tier(&self, tier: RateTier) -> Result<()> {
    let id_str    = encode_uuid(tier.id);
    let event_str = encode_uuid(tier.event_id);
    let name      = tier.name;
    let price_str = encode_decimal(tier.price);
    let start_str = encode_dt(tier.starts_at);
    let end_str   = encode_dt(tier.ends_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO rate_tiers (tier_id, event_id, name, price, starts_at, ends_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![id_str, event_str, name, price_str, start_str, end_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn insert_district(&self, district: District) -> Result<()> {
    let id_str = encode_uuid(district.id);
    let name   = district.name;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO districts (district_id, name) VALUES (?1, ?2)",
          rusqlite::params![id_str, name],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn insert_church(&self, church: Church) -> Result<()> {
    let id_str       = encode_uuid(church.id);
    let district_str = encode_uuid(church.district_id);
    let name         = church.name;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO churches (church_id, district_id, name) VALUES (?1, ?2, ?3)",
          rusqlite::params![id_str, district_str, name],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
