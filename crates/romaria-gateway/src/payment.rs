//! Client for the PIX payment provider.
//!
//! Both operations make up to [`REQUEST_ATTEMPTS`] tries. Charge creation
//! carries an idempotency key, so a retry after a timeout can never issue a
//! second charge.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use romaria_core::gateway::{Charge, ChargeRequest, ChargeStatus, PaymentGateway};

use crate::error::{Error, Result};

/// Tries per provider call before surfacing an error.
const REQUEST_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone)]
pub struct PaymentConfig {
  pub base_url:         String,
  pub token:            String,
  pub timeout_secs:     u64,
  /// Where the provider posts payment-status webhooks.
  pub notification_url: String,
  /// Recorded on payment rows; distinguishes providers if one is swapped in
  /// later.
  pub provider_name:    String,
}

#[derive(Clone)]
pub struct PixClient {
  client: Client,
  config: PaymentConfig,
}

/// The provider's charge document, shared by creation and fetch.
#[derive(Debug, Deserialize)]
struct ChargeBody {
  id:         String,
  status:     String,
  pix_code:   String,
  #[serde(default)]
  qr_base64:  Option<String>,
  #[serde(default)]
  expires_at: Option<DateTime<Utc>>,
}

impl PixClient {
  pub fn new(config: PaymentConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
  }

  fn into_charge(&self, body: ChargeBody) -> Charge {
    Charge {
      provider:            self.config.provider_name.clone(),
      provider_payment_id: body.id,
      status:              parse_status(&body.status),
      pix_code:            body.pix_code,
      pix_qr_image:        body.qr_base64,
      expires_at:          body.expires_at,
    }
  }

  /// Issue one provider request, retrying transient failures in place. The
  /// builder closure is re-invoked per attempt.
  async fn request(
    &self,
    build: impl Fn() -> reqwest::RequestBuilder,
  ) -> Result<ChargeBody> {
    let mut last = Error::Exhausted { attempts: REQUEST_ATTEMPTS };

    for attempt in 1..=REQUEST_ATTEMPTS {
      match build().send().await {
        Ok(resp) if resp.status().is_success() => {
          return resp.json().await.map_err(|e| Error::Payload(e.to_string()));
        }
        Ok(resp) => {
          let status = resp.status().as_u16();
          let body = resp.text().await.unwrap_or_default();
          warn!(attempt, status, "provider rejected charge request");
          last = Error::Provider { status, body };
        }
        Err(e) => {
          warn!(attempt, error = %e, "charge request failed");
          last = Error::Http(e);
        }
      }
    }

    Err(last)
  }
}

/// Unknown status strings are treated as still pending; a later fetch will
/// see the terminal state.
fn parse_status(raw: &str) -> ChargeStatus {
  match raw.to_ascii_lowercase().as_str() {
    "approved" | "paid" | "settled" => ChargeStatus::Approved,
    "rejected" | "cancelled" | "refused" => ChargeStatus::Rejected,
    "expired" => ChargeStatus::Expired,
    "pending" | "created" | "processing" => ChargeStatus::Pending,
    other => {
      warn!(status = other, "unknown charge status from provider");
      ChargeStatus::Pending
    }
  }
}

impl PaymentGateway for PixClient {
  type Error = Error;

  async fn create_charge(&self, request: &ChargeRequest) -> Result<Charge> {
    let payload = json!({
      "amount": request.amount.to_string(),
      "description": request.description,
      "payer": {
        "name": request.payer_name,
        "cpf": request.payer_cpf,
      },
      "notification_url": self.config.notification_url,
    });

    let url = self.url("/charges");
    let body = self
      .request(|| {
        self
          .client
          .post(&url)
          .bearer_auth(&self.config.token)
          .header("idempotency-key", &request.idempotency_key)
          .json(&payload)
      })
      .await?;
    Ok(self.into_charge(body))
  }

  async fn fetch_charge(&self, provider_payment_id: &str) -> Result<Charge> {
    let url = self.url(&format!("/charges/{provider_payment_id}"));
    let body = self
      .request(|| self.client.get(&url).bearer_auth(&self.config.token))
      .await?;
    Ok(self.into_charge(body))
  }
}
