//! Typed ManageIQ resources
//!
//! Thin accessors on [`Client`](crate::api::client::Client) for the
//! collections this crate knows about. Each one resolves its path through
//! the request builder, sends it, and decodes the body into a typed model.
//!
//! - [`groups`] - `GET /groups`, `GET /groups/{id}`
//! - [`service_catalogs`] - `GET /service_catalogs`
//! - [`services`] - `GET /services`, `GET /services/{id}`, `POST /services/{id}`

pub mod groups;
mod models;
pub mod service_catalogs;
pub mod services;

pub use groups::{Group, Groups};
pub use models::{Action, Links, ListResource, ResourceRef};
pub use service_catalogs::ServiceCatalogs;
pub use services::{Service, Services, Vm};
