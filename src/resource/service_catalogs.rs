//! Service catalogs

use super::models::ListResource;
use crate::api::client::Client;
use crate::error::Result;
use reqwest::Method;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceCatalogs {
    #[serde(flatten)]
    pub list: ListResource,
}

impl std::ops::Deref for ServiceCatalogs {
    type Target = ListResource;

    fn deref(&self) -> &ListResource {
        &self.list
    }
}

impl Client {
    /// List all service catalogs
    pub async fn get_service_catalogs(&self) -> Result<ServiceCatalogs> {
        let request = self.request(Method::GET, "/service_catalogs", &[])?.build()?;
        let response = self.send_request::<ServiceCatalogs>(request).await?;
        Ok(response.result.unwrap_or_default())
    }
}
