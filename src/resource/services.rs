//! Services and their VMs

use super::models::{null_as_default, ListResource};
use crate::api::client::Client;
use crate::error::Result;
use reqwest::Method;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Services {
    #[serde(flatten)]
    pub list: ListResource,
}

impl std::ops::Deref for Services {
    type Target = ListResource;

    fn deref(&self) -> &ListResource {
        &self.list
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Service {
    #[serde(flatten)]
    pub list: ListResource,
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub href: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub created_at: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub updated_at: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub retired: bool,
    #[serde(default)]
    pub retires_on: Option<String>,
    #[serde(default)]
    pub lifecycle_state: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub vms: Vec<Vm>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vm {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    pub description: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub vendor: String,
    #[serde(deserialize_with = "null_as_default")]
    pub created_on: String,
    pub ems_created_on: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub ems_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub ems_ref: String,
    /// Backend id of the VM (e.g. the PowerVS instance id)
    #[serde(deserialize_with = "null_as_default")]
    pub uid_ems: String,
    #[serde(deserialize_with = "null_as_default")]
    pub raw_power_state: String,
    #[serde(deserialize_with = "null_as_default")]
    pub ipaddresses: Vec<String>,
}

impl Client {
    /// List services; `queries` are passed through (e.g. `expand`, `attributes`, `filter[]`)
    pub async fn list_services(&self, queries: &[(&str, &str)]) -> Result<Services> {
        let mut builder = self.request(Method::GET, "/services", &[])?;
        builder.add_queries(queries.iter().copied());
        let response = self.send_request::<Services>(builder.build()?).await?;
        Ok(response.result.unwrap_or_default())
    }

    /// Fetch one service by id
    pub async fn get_service(&self, id: &str, queries: &[(&str, &str)]) -> Result<Service> {
        let mut builder = self.request(Method::GET, "/services/{id}", &[("id", id)])?;
        builder.add_queries(queries.iter().copied());
        let response = self.send_request::<Service>(builder.build()?).await?;
        Ok(response.result.unwrap_or_default())
    }

    /// POST an action body (e.g. `{"action": "edit", "resource": {...}}`) to a service
    pub async fn update_service<B: Serialize + ?Sized>(&self, id: &str, body: &B) -> Result<Service> {
        let mut builder = self.request(Method::POST, "/services/{id}", &[("id", id)])?;
        builder.set_body_content_json(body)?;
        let response = self.send_request::<Service>(builder.build()?).await?;
        Ok(response.result.unwrap_or_default())
    }
}
