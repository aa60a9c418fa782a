//! The conversational registration engine: intent classification, the
//! session state machine, the registration & settlement pipeline and
//! payment-webhook reconciliation.
//!
//! Everything here is generic over the [`romaria_core::store::BotStore`] and
//! gateway traits; no HTTP or database code lives in this crate.

pub mod collect;
pub mod flow;
pub mod intent;
pub mod receipt;
pub mod reconcile;
pub mod replies;
pub mod settlement;

pub use flow::{FlowEngine, InboundMessage};
pub use reconcile::{ReconcileOutcome, Reconciler};

#[cfg(test)]
pub(crate) mod testing;
