//! Groups

use super::models::{null_as_default, Action, ListResource};
use crate::api::client::Client;
use crate::error::Result;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Group {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub href: String,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    pub detailed_description: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub group_type: String,
    pub sequence: Option<i64>,
    #[serde(deserialize_with = "null_as_default")]
    pub tenant_id: String,
    pub settings: Option<Value>,
    #[serde(deserialize_with = "null_as_default")]
    pub created_on: String,
    #[serde(deserialize_with = "null_as_default")]
    pub updated_on: String,
    #[serde(deserialize_with = "null_as_default")]
    pub actions: Vec<Action>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Groups {
    #[serde(flatten)]
    pub list: ListResource,
}

impl std::ops::Deref for Groups {
    type Target = ListResource;

    fn deref(&self) -> &ListResource {
        &self.list
    }
}

impl Client {
    /// List all groups
    pub async fn get_groups(&self) -> Result<Groups> {
        let request = self.request(Method::GET, "/groups", &[])?.build()?;
        let response = self.send_request::<Groups>(request).await?;
        Ok(response.result.unwrap_or_default())
    }

    /// Fetch one group by id
    pub async fn get_group(&self, id: &str) -> Result<Group> {
        let request = self
            .request(Method::GET, "/groups/{id}", &[("id", id)])?
            .build()?;
        let response = self.send_request::<Group>(request).await?;
        Ok(response.result.unwrap_or_default())
    }
}
