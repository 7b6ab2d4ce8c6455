//! Image captioning and visual question answering over hosted inference models.
//!
//! [`client::InferenceClient`] hides the "model is still loading" state of
//! on-demand model hosting behind a fixed polling loop; [`server`] is the thin
//! web page and JSON API in front of it.

pub mod client;
pub mod config;
pub mod error;
pub mod payload;
pub mod retry;
pub mod server;
pub mod transport;

pub use client::InferenceClient;
pub use config::{Config, InferenceConfig};
pub use error::{InferenceError, TransportError};
pub use payload::{ImagePayload, Question};
pub use retry::RetryPolicy;
