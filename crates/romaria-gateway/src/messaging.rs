//! Client for the WhatsApp-style messaging provider.
//!
//! Every send makes up to [`SEND_ATTEMPTS`] tries against the provider.
//! Interactive prompts walk a graded fallback: a structured button list,
//! then quick replies addressed by label, then quick replies addressed by
//! id, then plain numbered text — the text form needs no provider feature
//! support and is always reachable.

use std::time::Duration;

use reqwest::Client;
use serde_json::{Value, json};
use tracing::{debug, warn};

use romaria_core::gateway::{MenuOption, MessageSender};

use crate::error::{Error, Result};

/// Tries per HTTP send before surfacing an error.
const SEND_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone)]
pub struct MessagingConfig {
  pub base_url:     String,
  pub token:        String,
  pub timeout_secs: u64,
}

/// Cheap to clone — the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct HttpMessenger {
  client: Client,
  config: MessagingConfig,
}

impl HttpMessenger {
  pub fn new(config: MessagingConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
  }

  /// POST one JSON payload, retrying transient failures in place.
  async fn post(&self, path: &str, payload: &Value) -> Result<()> {
    let url = self.url(path);
    let mut last = Error::Exhausted { attempts: SEND_ATTEMPTS };

    for attempt in 1..=SEND_ATTEMPTS {
      let result = self
        .client
        .post(&url)
        .bearer_auth(&self.config.token)
        .json(payload)
        .send()
        .await;

      match result {
        Ok(resp) if resp.status().is_success() => return Ok(()),
        Ok(resp) => {
          let status = resp.status().as_u16();
          let body = resp.text().await.unwrap_or_default();
          warn!(url, attempt, status, "provider rejected send");
          last = Error::Provider { status, body };
        }
        Err(e) => {
          warn!(url, attempt, error = %e, "send attempt failed");
          last = Error::Http(e);
        }
      }
    }

    Err(last)
  }
}

/// The provider's structured "choose one" payload, buttons variant.
fn button_payload(to: &str, header: &str, options: &[MenuOption]) -> Value {
  json!({
    "to": to,
    "type": "button",
    "body": { "text": header },
    "action": {
      "buttons": options.iter().map(|o| json!({
        "type": "quick_reply",
        "id": o.id,
        "title": o.label,
      })).collect::<Vec<_>>(),
    },
  })
}

/// Quick-reply variant for providers without button lists, options
/// addressed by their label.
fn quick_reply_payload(to: &str, header: &str, options: &[MenuOption]) -> Value {
  json!({
    "to": to,
    "body": header,
    "quick_replies": options.iter().map(|o| o.label.clone()).collect::<Vec<_>>(),
  })
}

/// Quick-reply variant addressing options by id, for client versions that
/// reject the label form.
fn quick_reply_id_payload(to: &str, header: &str, options: &[MenuOption]) -> Value {
  json!({
    "to": to,
    "body": header,
    "quick_replies": options.iter().map(|o| json!({
      "id": o.id,
      "title": o.label,
    })).collect::<Vec<_>>(),
  })
}

/// The interactive payloads to try, in order. Provider support for these
/// forms varies across client versions; the caller falls back to plain
/// text when all of them are refused.
fn menu_tiers(
  to: &str,
  header: &str,
  options: &[MenuOption],
) -> [(&'static str, Value); 3] {
  [
    ("button list", button_payload(to, header, options)),
    ("quick replies by label", quick_reply_payload(to, header, options)),
    ("quick replies by id", quick_reply_id_payload(to, header, options)),
  ]
}

/// The universal fallback: the options rendered as numbered lines.
pub(crate) fn numbered_text(header: &str, options: &[MenuOption]) -> String {
  let mut text = String::from(header);
  for option in options {
    text.push('\n');
    text.push_str(&option.label);
  }
  text
}

impl MessageSender for HttpMessenger {
  type Error = Error;

  async fn send_text(&self, to: &str, body: &str) -> Result<()> {
    self
      .post("/messages/text", &json!({ "to": to, "body": body }))
      .await
  }

  async fn send_image(
    &self,
    to: &str,
    image_base64: &str,
    caption: &str,
  ) -> Result<()> {
    self
      .post("/messages/image", &json!({
        "to": to,
        "media": image_base64,
        "caption": caption,
      }))
      .await
  }

  async fn send_menu(
    &self,
    to: &str,
    header: &str,
    options: &[MenuOption],
  ) -> Result<()> {
    for (tier, payload) in &menu_tiers(to, header, options) {
      match self.post("/messages/interactive", payload).await {
        Ok(()) => return Ok(()),
        Err(e) => debug!(to, tier, error = %e, "interactive tier refused"),
      }
    }

    self.send_text(to, &numbered_text(header, options)).await
  }
}
