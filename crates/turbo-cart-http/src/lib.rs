//! HTTP transport for the TurboCart sync engine.
//!
//! `HttpCartTransport` speaks the storefront's JSON cart API: a GET for the
//! full cart and form-encoded POSTs for mutations, with the anti-forgery
//! token and session cookie attached.
//!
//! # Example
//!
//! ```rust,no_run
//! use turbo_cart_http::{HttpCartTransport, HttpTransportConfig};
//! use turbo_cart_sync::{SyncConfig, SyncEngine};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = HttpTransportConfig::new("https://shop.example.com")
//!     .with_csrf_token("token-from-page")
//!     .with_session_cookie("sessionid=abc");
//! let transport = HttpCartTransport::new(config)?;
//!
//! let engine = SyncEngine::connect("session-abc", transport, SyncConfig::default()).await?;
//! engine.add("42").await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod token;

pub use client::HttpCartTransport;
pub use config::HttpTransportConfig;
pub use token::{AntiForgeryToken, StaticToken};
