//! `POST /webhooks/messages` — inbound messages from the messaging provider.
//!
//! The provider delivers at least once and expects a 200 for anything it
//! could parse on its side; a non-200 only triggers redelivery. So apart
//! from the shared-secret check, every outcome here is a 200: malformed
//! entries, echoes of our own sends and engine failures are logged, never
//! surfaced.

use axum::http::HeaderMap;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::{debug, error};

use romaria_core::{
  gateway::{MessageSender, PaymentGateway},
  store::BotStore,
};
use romaria_engine::InboundMessage;

use crate::{AppState, error::Error};

#[derive(Debug, Deserialize)]
pub struct MessagesWebhook {
  #[serde(default)]
  messages: Vec<Entry>,
}

/// One inbound entry. Every field is optional so one malformed entry never
/// poisons the batch.
#[derive(Debug, Deserialize)]
struct Entry {
  id:      Option<String>,
  from:    Option<String>,
  #[serde(default)]
  from_me: bool,
  text:    Option<TextBody>,
}

#[derive(Debug, Deserialize)]
struct TextBody {
  body: String,
}

/// Compare the shared-secret header by digest so the comparison shape does
/// not depend on where the strings first differ.
pub fn token_matches(provided: &str, expected: &str) -> bool {
  Sha256::digest(provided.as_bytes()) == Sha256::digest(expected.as_bytes())
}

pub async fn handler<S, M, P, B>(
  state: &AppState<S, M, P, B>,
  headers: &HeaderMap,
  body: &[u8],
) -> Result<(), Error>
where
  S: BotStore,
  M: MessageSender,
  P: PaymentGateway,
{
  let provided = headers
    .get("x-webhook-token")
    .and_then(|v| v.to_str().ok())
    .ok_or(Error::Unauthorized)?;
  if !token_matches(provided, &state.config.webhook_token) {
    return Err(Error::Unauthorized);
  }

  let Ok(webhook) = serde_json::from_slice::<MessagesWebhook>(body) else {
    debug!("unparsable messages webhook body");
    return Ok(());
  };

  for entry in webhook.messages {
    if entry.from_me {
      continue;
    }
    let (Some(id), Some(from), Some(text)) = (entry.id, entry.from, entry.text)
    else {
      debug!("skipping malformed webhook entry");
      continue;
    };

    let inbound = InboundMessage { id, from, text: text.body };
    if let Err(e) = state.engine.handle(&inbound).await {
      error!(message_id = %inbound.id, error = %e, "message handling failed");
    }
  }

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn token_comparison_is_exact() {
    assert!(token_matches("secret", "secret"));
    assert!(!token_matches("secret", "secret2"));
    assert!(!token_matches("", "secret"));
  }
}
