//! `POST /webhooks/payments` — payment-status notifications from the PIX
//! provider.
//!
//! The body is only trusted for the charge id; the reconciler re-fetches
//! the authoritative status. Providers differ in where they put the id
//! (JSON `data.id`, top-level `id`, or an `id` query parameter), so all
//! three are accepted. Always 200 — anomalies are logged and the provider
//! must never be driven into a redelivery loop by our internals.

use std::collections::HashMap;

use serde::Deserialize;
use tracing::{debug, error, info};

use romaria_core::{
  gateway::{BlobStore, MessageSender, PaymentGateway},
  store::BotStore,
};

use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct PaymentsWebhook {
  id:   Option<String>,
  #[serde(default)]
  data: Option<PaymentData>,
}

#[derive(Debug, Deserialize)]
struct PaymentData {
  id: Option<String>,
}

/// Pull the provider payment id out of whichever slot it arrived in.
pub fn payment_id(body: &[u8], query: &HashMap<String, String>) -> Option<String> {
  let webhook: PaymentsWebhook = serde_json::from_slice(body).unwrap_or_default();
  webhook
    .data
    .and_then(|d| d.id)
    .or(webhook.id)
    .or_else(|| query.get("id").cloned())
}

pub async fn handler<S, M, P, B>(
  state: &AppState<S, M, P, B>,
  query: &HashMap<String, String>,
  body: &[u8],
) where
  S: BotStore,
  M: MessageSender,
  P: PaymentGateway,
  B: BlobStore,
{
  let Some(id) = payment_id(body, query) else {
    debug!("payments webhook without a charge id");
    return;
  };

  match state.reconciler.apply(&id).await {
    Ok(outcome) => info!(provider_payment_id = %id, ?outcome, "webhook reconciled"),
    Err(e) => error!(provider_payment_id = %id, error = %e, "reconciliation failed"),
  }
}
