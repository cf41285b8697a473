//! Pdfdesk - Core
//!
//! A typed client SDK for the broker PDF form-filler backend.
//!
//! # Overview
//!
//! Pdfdesk is the administrative layer that sits between brokers and the form
//! generation backend. It curates the standardized field registry, uploads PDF
//! templates, binds each template's AcroForm fields to registry entries, groups
//! templates into form sets and drives client-side form generation with daily
//! and monthly quota awareness.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use pdfdesk_core::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = PdfdeskConfig::load()?;
//!     pdfdesk_core::logging::init_logging(&config.logging.to_logging_config())?;
//!
//!     let session = SessionHandle::in_memory();
//!     let client = ApiClient::from_config(&config.api, session)?;
//!     AuthService::new(client.clone()).login("broker@example.com", "secret").await?;
//!
//!     let fields = FieldRegistry::new(client).list(&FieldFilter::default()).await?;
//!     println!("{} fields", fields.count);
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - [`transport`] - HTTP transport seam (`reqwest` in production, scripted in tests)
//! - [`api`] - Bearer-authenticated JSON client with refresh-on-401
//! - [`session`] - Token/identity session with pluggable persistence
//! - [`model`] - Backend resource types
//! - [`validation`] - Form validation producing typed payloads or field errors
//! - [`registry`] - CRUD services per resource
//! - [`ordering`] - Display-order planning and persistence
//! - [`workflow`] - Form generation wizard and batch downloads
//! - [`quota`] / [`dashboard`] - Quota gauges and dashboard polling

pub mod api;
pub mod config; // TOML + env configuration
pub mod dashboard;
pub mod error;
pub mod logging; // Structured logging on top of the log crate
pub mod model;
pub mod notify;
pub mod ordering;
pub mod prelude;
pub mod quota;
pub mod registry;
pub mod session;
pub mod transport;
pub mod validation;
pub mod workflow;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use api::ApiClient;
pub use error::{ApiError, FieldErrors};

/// Result type for every backend-facing operation
pub type Result<T> = std::result::Result<T, ApiError>;
