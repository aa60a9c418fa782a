//! Webhook server for the registration bot.
//!
//! Exposes an axum [`Router`] with the provider-facing endpoints, generic
//! over the storage and gateway traits so tests can run against in-memory
//! doubles.

pub mod blob;
pub mod error;
pub mod handlers;

pub use blob::FsBlobStore;
pub use error::Error;

use std::{collections::HashMap, path::PathBuf, sync::Arc};

use axum::{
  Router,
  body::Bytes,
  extract::{Path, Query, State},
  http::{HeaderMap, StatusCode},
  response::{IntoResponse, Response},
  routing::{get, post},
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use romaria_core::{
  gateway::{BlobStore, MessageSender, PaymentGateway},
  store::BotStore,
};
use romaria_engine::{FlowEngine, Reconciler};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` layered
/// with `ROMARIA_`-prefixed environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  pub host:            String,
  pub port:            u16,
  /// External base URL, used to build receipt links.
  pub public_base_url: String,
  pub store_path:      PathBuf,
  pub blob_dir:        PathBuf,
  /// Shared secret expected in `x-webhook-token` on the messages webhook.
  pub webhook_token:   String,
  pub messaging:       MessagingSettings,
  pub payments:        PaymentSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessagingSettings {
  pub base_url:     String,
  pub token:        String,
  pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentSettings {
  pub base_url:         String,
  pub token:            String,
  pub timeout_secs:     u64,
  pub notification_url: String,
  #[serde(default = "default_provider_name")]
  pub provider_name:    String,
}

fn default_provider_name() -> String {
  "pix".to_string()
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S, M, P, B> {
  pub engine:     Arc<FlowEngine<S, M, P>>,
  pub reconciler: Arc<Reconciler<S, M, P, B>>,
  pub config:     Arc<ServerConfig>,
}

impl<S, M, P, B> Clone for AppState<S, M, P, B> {
  fn clone(&self) -> Self {
    Self {
      engine:     self.engine.clone(),
      reconciler: self.reconciler.clone(),
      config:     self.config.clone(),
    }
  }
}

impl<S, M, P, B> AppState<S, M, P, B>
where
  S: BotStore,
  M: MessageSender,
  P: PaymentGateway,
  B: BlobStore,
{
  pub fn new(
    store: Arc<S>,
    messenger: Arc<M>,
    gateway: Arc<P>,
    blobs: Arc<B>,
    config: ServerConfig,
  ) -> Self {
    let engine = Arc::new(FlowEngine::new(
      store.clone(),
      messenger.clone(),
      gateway.clone(),
    ));
    let reconciler = Arc::new(Reconciler::new(
      store,
      messenger,
      gateway,
      blobs,
      config.public_base_url.clone(),
    ));
    Self { engine, reconciler, config: Arc::new(config) }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the axum [`Router`] for the webhook server.
pub fn router<S, M, P, B>(state: AppState<S, M, P, B>) -> Router
where
  S: BotStore + 'static,
  M: MessageSender + 'static,
  P: PaymentGateway + 'static,
  B: BlobStore + 'static,
{
  Router::new()
    .route("/webhooks/messages", post(messages_handler::<S, M, P, B>))
    .route("/webhooks/payments", post(payments_handler::<S, M, P, B>))
    .route("/receipts/{name}", get(receipts_handler::<S, M, P, B>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

async fn messages_handler<S, M, P, B>(
  State(state): State<AppState<S, M, P, B>>,
  headers: HeaderMap,
  body: Bytes,
) -> Response
where
  S: BotStore + 'static,
  M: MessageSender + 'static,
  P: PaymentGateway + 'static,
  B: BlobStore + 'static,
{
  match handlers::messages::handler(&state, &headers, &body).await {
    Ok(()) => StatusCode::OK.into_response(),
    Err(e) => e.into_response(),
  }
}

async fn payments_handler<S, M, P, B>(
  State(state): State<AppState<S, M, P, B>>,
  Query(query): Query<HashMap<String, String>>,
  body: Bytes,
) -> StatusCode
where
  S: BotStore + 'static,
  M: MessageSender + 'static,
  P: PaymentGateway + 'static,
  B: BlobStore + 'static,
{
  handlers::payments::handler(&state, &query, &body).await;
  StatusCode::OK
}

async fn receipts_handler<S, M, P, B>(
  State(state): State<AppState<S, M, P, B>>,
  Path(name): Path<String>,
) -> Response
where
  S: BotStore + 'static,
  M: MessageSender + 'static,
  P: PaymentGateway + 'static,
  B: BlobStore + 'static,
{
  match handlers::receipts::handler(&state.config.blob_dir, &name).await {
    Ok(response) => response,
    Err(e) => e.into_response(),
  }
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::Mutex;

  use axum::{body::Body, http::Request};
  use chrono::{Duration, Utc};
  use romaria_core::{
    event::{Event, RateTier},
    gateway::{Charge, ChargeRequest, ChargeStatus},
    payment::{NewPayment, PaymentStatus},
    registration::{NewParticipant, NewRegistration, RegistrationStatus},
  };
  use romaria_store_sqlite::SqliteStore;
  use rust_decimal_macros::dec;
  use tower::ServiceExt as _;
  use uuid::Uuid;

  #[derive(Debug, thiserror::Error)]
  #[error("test double failure")]
  struct DoubleError;

  /// Records outbound text/menu traffic; sends never fail.
  #[derive(Default)]
  struct Messenger {
    sent: Mutex<Vec<String>>,
  }

  impl Messenger {
    fn sent(&self) -> Vec<String> {
      self.sent.lock().unwrap().clone()
    }
  }

  impl romaria_core::gateway::MessageSender for Messenger {
    type Error = DoubleError;

    async fn send_text(&self, _to: &str, body: &str) -> Result<(), DoubleError> {
      self.sent.lock().unwrap().push(body.to_string());
      Ok(())
    }

    async fn send_image(
      &self,
      _to: &str,
      _image_base64: &str,
      caption: &str,
    ) -> Result<(), DoubleError> {
      self.sent.lock().unwrap().push(caption.to_string());
      Ok(())
    }

    async fn send_menu(
      &self,
      _to: &str,
      header: &str,
      _options: &[romaria_core::gateway::MenuOption],
    ) -> Result<(), DoubleError> {
      self.sent.lock().unwrap().push(header.to_string());
      Ok(())
    }
  }

  /// Charges listed in `approved` fetch as approved, everything else as
  /// pending.
  #[derive(Default)]
  struct Gateway {
    approved: Mutex<Vec<String>>,
  }

  impl Gateway {
    fn approve(&self, id: &str) {
      self.approved.lock().unwrap().push(id.to_string());
    }
  }

  impl romaria_core::gateway::PaymentGateway for Gateway {
    type Error = DoubleError;

    async fn create_charge(
      &self,
      request: &ChargeRequest,
    ) -> Result<Charge, DoubleError> {
      Ok(Charge {
        provider:            "fake".to_string(),
        provider_payment_id: format!("chg_{}", request.idempotency_key),
        status:              ChargeStatus::Pending,
        pix_code:            "00020126...".to_string(),
        pix_qr_image:        None,
        expires_at:          None,
      })
    }

    async fn fetch_charge(&self, id: &str) -> Result<Charge, DoubleError> {
      let status = if self.approved.lock().unwrap().iter().any(|a| a == id) {
        ChargeStatus::Approved
      } else {
        ChargeStatus::Pending
      };
      Ok(Charge {
        provider:            "fake".to_string(),
        provider_payment_id: id.to_string(),
        status,
        pix_code:            "00020126...".to_string(),
        pix_qr_image:        None,
        expires_at:          None,
      })
    }
  }

  struct Fixture {
    store:     Arc<SqliteStore>,
    messenger: Arc<Messenger>,
    gateway:   Arc<Gateway>,
    state:     AppState<SqliteStore, Messenger, Gateway, FsBlobStore>,
    blob_dir:  PathBuf,
  }

  async fn fixture() -> Fixture {
    let blob_dir =
      std::env::temp_dir().join(format!("romaria-server-{}", Uuid::new_v4()));
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let messenger = Arc::new(Messenger::default());
    let gateway = Arc::new(Gateway::default());
    let blobs = Arc::new(FsBlobStore::new(&blob_dir));
    let config = ServerConfig {
      host:            "127.0.0.1".to_string(),
      port:            8080,
      public_base_url: "https://bot.romaria.org".to_string(),
      store_path:      PathBuf::from(":memory:"),
      blob_dir:        blob_dir.clone(),
      webhook_token:   "sekrit".to_string(),
      messaging:       MessagingSettings {
        base_url:     "http://messaging.test".to_string(),
        token:        "t".to_string(),
        timeout_secs: 5,
      },
      payments:        PaymentSettings {
        base_url:         "http://payments.test".to_string(),
        token:            "t".to_string(),
        timeout_secs:     5,
        notification_url: "https://bot.romaria.org/webhooks/payments".to_string(),
        provider_name:    "pix".to_string(),
      },
    };
    let state = AppState::new(
      store.clone(),
      messenger.clone(),
      gateway.clone(),
      blobs,
      config,
    );
    Fixture { store, messenger, gateway, state, blob_dir }
  }

  async fn post(
    fx: &Fixture,
    uri: &str,
    token: Option<&str>,
    body: &str,
  ) -> axum::response::Response {
    let mut builder = Request::builder()
      .method("POST")
      .uri(uri)
      .header("content-type", "application/json");
    if let Some(token) = token {
      builder = builder.header("x-webhook-token", token);
    }
    let req = builder.body(Body::from(body.to_string())).unwrap();
    router(fx.state.clone()).oneshot(req).await.unwrap()
  }

  fn message_body(id: &str, text: &str) -> String {
    format!(
      r#"{{"messages":[{{"id":"{id}","from":"5561999887766","from_me":false,"text":{{"body":"{text}"}}}}]}}"#
    )
  }

  // ── Messages webhook ────────────────────────────────────────────────────────

  #[tokio::test]
  async fn missing_or_wrong_token_is_unauthorized() {
    let fx = fixture().await;

    let resp = post(&fx, "/webhooks/messages", None, &message_body("m1", "oi")).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp =
      post(&fx, "/webhooks/messages", Some("wrong"), &message_body("m1", "oi"))
        .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    assert!(fx.store.get_session("5561999887766").await.unwrap().is_none());
  }

  #[tokio::test]
  async fn inbound_message_reaches_the_engine() {
    let fx = fixture().await;

    let resp =
      post(&fx, "/webhooks/messages", Some("sekrit"), &message_body("m1", "oi"))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let session = fx.store.get_session("5561999887766").await.unwrap().unwrap();
    assert_eq!(session.last_message_id.as_deref(), Some("m1"));
    assert!(!fx.messenger.sent().is_empty());
  }

  #[tokio::test]
  async fn own_echoes_and_malformed_entries_are_acknowledged() {
    let fx = fixture().await;

    let body = r#"{"messages":[
      {"id":"m1","from":"5561999887766","from_me":true,"text":{"body":"eco"}},
      {"id":"m2","from_me":false}
    ]}"#;
    let resp = post(&fx, "/webhooks/messages", Some("sekrit"), body).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = post(&fx, "/webhooks/messages", Some("sekrit"), "not json").await;
    assert_eq!(resp.status(), StatusCode::OK);

    assert!(fx.store.get_session("5561999887766").await.unwrap().is_none());
    assert!(fx.messenger.sent().is_empty());
  }

  // ── Payments webhook ────────────────────────────────────────────────────────

  /// Seed an event, a pending registration with one participant and its
  /// pending payment; returns (registration_id, provider_payment_id).
  async fn seed_pending_payment(fx: &Fixture) -> (Uuid, String) {
    let now = Utc::now();
    let event = Event {
      id:        Uuid::new_v4(),
      name:      "Romaria 2026".to_string(),
      opens_at:  now - Duration::days(1),
      closes_at: now + Duration::days(1),
    };
    fx.store.insert_event(event.clone()).await.unwrap();
    fx.store
      .insert_rate_tier(RateTier {
        id:        Uuid::new_v4(),
        event_id:  event.id,
        name:      "Lote 1".to_string(),
        price:     dec!(80.00),
        starts_at: now - Duration::days(1),
        ends_at:   now + Duration::days(1),
      })
      .await
      .unwrap();

    let registration = fx
      .store
      .insert_registration(NewRegistration {
        event_id:      event.id,
        contact_phone: "5561999887766".to_string(),
        total:         dec!(80.00),
      })
      .await
      .unwrap();
    fx.store
      .insert_participant(NewParticipant {
        registration_id: registration.id,
        event_id:        event.id,
        name:            "Alice Souza".to_string(),
        cpf:             "52998224725".to_string(),
        birthdate:       None,
        gender:          None,
        district_id:     None,
        church_id:       None,
        phone:           None,
      })
      .await
      .unwrap();

    let provider_id = "chg_webhook_test".to_string();
    fx.store
      .insert_payment(NewPayment {
        registration_id:     registration.id,
        provider:            "fake".to_string(),
        provider_payment_id: provider_id.clone(),
        status:              PaymentStatus::Pending,
        pix_code:            "00020126...".to_string(),
        pix_qr_image:        None,
        expires_at:          None,
      })
      .await
      .unwrap();

    (registration.id, provider_id)
  }

  #[tokio::test]
  async fn unknown_payment_id_still_returns_200() {
    let fx = fixture().await;
    let resp = post(
      &fx,
      "/webhooks/payments",
      None,
      r#"{"data":{"id":"chg_nope"}}"#,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
  }

  #[tokio::test]
  async fn approved_payment_webhook_settles_the_registration() {
    let fx = fixture().await;
    let (registration_id, provider_id) = seed_pending_payment(&fx).await;
    fx.gateway.approve(&provider_id);

    let body = format!(r#"{{"data":{{"id":"{provider_id}"}}}}"#);
    let resp = post(&fx, "/webhooks/payments", None, &body).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let registration =
      fx.store.get_registration(registration_id).await.unwrap().unwrap();
    assert_eq!(registration.status, RegistrationStatus::Paid);

    // Receipt landed in the blob dir and is now served back over HTTP.
    let uri = format!("/receipts/{registration_id}.html");
    let req = Request::builder()
      .method("GET")
      .uri(&uri)
      .body(Body::empty())
      .unwrap();
    let resp = router(fx.state.clone()).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let html = std::str::from_utf8(&bytes).unwrap();
    assert!(html.contains("Alice Souza"), "receipt body: {html}");

    tokio::fs::remove_dir_all(&fx.blob_dir).await.unwrap();
  }

  #[tokio::test]
  async fn pending_charge_does_not_settle() {
    let fx = fixture().await;
    let (registration_id, provider_id) = seed_pending_payment(&fx).await;

    let body = format!(r#"{{"id":"{provider_id}"}}"#);
    let resp = post(&fx, "/webhooks/payments", None, &body).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let registration =
      fx.store.get_registration(registration_id).await.unwrap().unwrap();
    assert_eq!(registration.status, RegistrationStatus::Pending);
  }

  #[tokio::test]
  async fn payment_id_from_query_string_works() {
    let fx = fixture().await;
    let (registration_id, provider_id) = seed_pending_payment(&fx).await;
    fx.gateway.approve(&provider_id);

    let uri = format!("/webhooks/payments?id={provider_id}");
    let resp = post(&fx, &uri, None, "").await;
    assert_eq!(resp.status(), StatusCode::OK);

    let registration =
      fx.store.get_registration(registration_id).await.unwrap().unwrap();
    assert_eq!(registration.status, RegistrationStatus::Paid);

    tokio::fs::remove_dir_all(&fx.blob_dir).await.ok();
  }

  // ── Receipts ────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn missing_receipt_is_404() {
    let fx = fixture().await;
    let req = Request::builder()
      .method("GET")
      .uri("/receipts/nope.html")
      .body(Body::empty())
      .unwrap();
    let resp = router(fx.state.clone()).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }
}
