//! Error types for `romaria-core`.
//!
//! The taxonomy drives recovery: validation and duplicate errors are answered
//! with a re-prompt, not-found errors reset the conversation, gateway errors
//! surface a support fallback, configuration errors abort the request.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  /// Bad user input — always recoverable by re-prompting.
  #[error("validation: {0}")]
  Validation(String),

  #[error("event not found: {0}")]
  EventNotFound(Uuid),

  #[error("registration not found: {0}")]
  RegistrationNotFound(Uuid),

  #[error("no pending payment found for cpf ending {0}")]
  PaymentNotFound(String),

  /// The CPF is already registered for this event. The record is discarded
  /// and the flow continues with the next slot.
  #[error("cpf already registered for event {event_id}")]
  DuplicateCpf { event_id: Uuid, cpf: String },

  /// Messaging or payment provider failure after retries were exhausted.
  #[error("{provider} gateway: {message}")]
  Gateway { provider: String, message: String },

  /// No rate tier covers the current date, or credentials are missing.
  /// Fatal for the request; nothing is created past this point.
  #[error("no active rate tier for event {0}")]
  NoActiveRateTier(Uuid),

  #[error("configuration: {0}")]
  Configuration(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Wrap a backend error from a `BotStore` implementation.
  pub fn store<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(err))
  }

  /// Wrap a gateway client error, tagged with the provider name.
  pub fn gateway<E>(provider: &str, err: E) -> Self
  where
    E: std::fmt::Display,
  {
    Self::Gateway {
      provider: provider.to_string(),
      message:  err.to_string(),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
