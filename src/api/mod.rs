//! ManageIQ API interaction module
//!
//! This module provides the core functionality for talking to a ManageIQ
//! REST API: request building, pluggable authentication, the HTTP transport
//! and the client that ties them together.
//!
//! # Module Structure
//!
//! - [`request`] - Resolve templated paths and build transport-ready requests
//! - [`auth`] - Basic, bearer and Keycloak authenticators
//! - [`http`] - Transport trait and the reqwest-backed implementation
//! - [`client`] - Main client: authenticate, send, classify, decode
//!
//! # Example
//!
//! ```no_run
//! use manageiq::api::auth::BasicAuthenticator;
//! use manageiq::api::client::{Client, ClientParams};
//! use std::sync::Arc;
//!
//! async fn example() -> manageiq::Result<()> {
//!     let auth = BasicAuthenticator::new("admin", "smartvm")
//!         .with_base_url("https://127.0.0.1:8443/api")
//!         .with_insecure(true);
//!     let client = Client::new(Arc::new(auth), ClientParams { insecure: true })?;
//!     let catalogs = client.get_service_catalogs().await?;
//!     println!("{} catalogs", catalogs.count);
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod http;
pub mod request;
