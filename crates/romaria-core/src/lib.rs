//! Core types and trait definitions for the Romaria registration bot.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

pub mod error;
pub mod event;
pub mod gateway;
pub mod payment;
pub mod registration;
pub mod session;
pub mod store;
pub mod validate;

pub use error::{Error, Result};
