//! Typed client for the ManageIQ REST management API
//!
//! Requests are assembled with a [`RequestBuilder`], signed by one of the
//! pluggable [`Authenticator`]s, sent through a [`Transport`], and the
//! response is classified and decoded by the [`Client`].
//!
//! # Module Structure
//!
//! - [`api`] - request building, authentication, transport and client
//! - [`resource`] - typed groups, services and service catalogs
//! - [`error`] - the crate error type

pub mod api;
pub mod error;
pub mod resource;

pub use api::auth::{
    Authenticator, BasicAuthenticator, BearerAuthenticator, KeycloakAuthenticator, DEFAULT_BASE_URL,
};
pub use api::client::{Client, ClientParams};
pub use api::http::{DetailedResponse, HttpResponse, HttpTransport, Transport};
pub use api::request::{FormContents, Request, RequestBuilder};
pub use error::{AuthenticationError, Error, Result};
pub use reqwest::Method;
