//! # API Module
//!
//! Request handlers for the short-lived loopback listener started during
//! authorization (see [`crate::server`]).
//!
//! - [`callback`] - receives the OAuth redirect, checks `state` and hands the
//!   authorization code (or the `error` parameter) back to the waiting
//!   authorization flow through a one-shot channel.

mod callback;

pub use callback::{CallbackParams, CallbackResult, CallbackState, callback};
