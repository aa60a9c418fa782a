//! Error type for `romaria-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] romaria_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("decimal parse error: {0}")]
  DecimalParse(String),

  /// A participant with this CPF already exists for the event — the
  /// `(event_id, cpf)` uniqueness constraint fired.
  #[error("cpf {cpf} already registered for event {event_id}")]
  DuplicateCpf { event_id: uuid::Uuid, cpf: String },

  #[error("unknown enum value in column: {0:?}")]
  UnknownEnumValue(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
