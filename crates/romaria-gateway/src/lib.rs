//! HTTP clients for the external providers: the WhatsApp-style messaging
//! API and the PIX payment API.
//!
//! Both clients implement the collaborator traits from `romaria_core` so the
//! engine never sees `reqwest`. Outbound calls use a bounded per-attempt
//! timeout and a fixed small retry count, no backoff growth.

pub mod error;
pub mod messaging;
pub mod payment;

pub use error::Error;
pub use messaging::{HttpMessenger, MessagingConfig};
pub use payment::{PaymentConfig, PixClient};
