//! REST client for the CRM HTTP API.

use async_trait::async_trait;
use serde::Deserialize;

use leadbridge_core::pipeline::PipelineStatus;
use leadbridge_core::types::DbId;

use crate::fields::StatusFieldMap;
use crate::types::{Organization, Person};
use crate::CrmApi;

/// Errors from the CRM API layer.
#[derive(Debug, thiserror::Error)]
pub enum CrmError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The CRM returned a non-2xx status code.
    #[error("CRM API error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The status field map has no option id for the requested status.
    #[error("No CRM option id mapped for pipeline status '{0}'")]
    UnmappedStatus(&'static str),
}

/// HTTP client for the CRM.
pub struct CrmClient {
    client: reqwest::Client,
    api_url: String,
    api_token: String,
    status_field: StatusFieldMap,
}

#[derive(Debug, Deserialize)]
struct ItemList<T> {
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct ItemEnvelope<T> {
    data: T,
}

impl CrmClient {
    /// Create a new client.
    ///
    /// * `api_url` - Base HTTP URL, e.g. `https://api.crm.example`.
    /// * `api_token` - API token for the CRM.
    pub fn new(api_url: String, api_token: String, status_field: StatusFieldMap) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url,
            api_token,
            status_field,
        }
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .get(format!("{}{path}", self.api_url))
            .bearer_auth(&self.api_token)
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .post(format!("{}{path}", self.api_url))
            .bearer_auth(&self.api_token)
    }

    fn put(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .put(format!("{}{path}", self.api_url))
            .bearer_auth(&self.api_token)
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or a [`CrmError::ApiError`]
    /// containing the status and body text on failure.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, CrmError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(CrmError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, CrmError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }

    /// Assert the response has a success status code, discarding the body.
    async fn check_status(response: reqwest::Response) -> Result<(), CrmError> {
        Self::ensure_success(response).await?;
        Ok(())
    }

    fn option_id(&self, status: PipelineStatus) -> Result<i64, CrmError> {
        self.status_field
            .option_id(status)
            .ok_or(CrmError::UnmappedStatus(status.as_str()))
    }
}

#[async_trait]
impl CrmApi for CrmClient {
    async fn find_org_by_name(&self, name: &str) -> Result<Option<Organization>, CrmError> {
        let response = self
            .get("/api/v1/organizations/search")
            .query(&[("name", name), ("exact", "true")])
            .send()
            .await?;
        let list: ItemList<Organization> = Self::parse_response(response).await?;
        Ok(list.items.into_iter().next())
    }

    async fn create_org(&self, name: &str) -> Result<Organization, CrmError> {
        let body = serde_json::json!({ "name": name });
        let response = self.post("/api/v1/organizations").json(&body).send().await?;
        let envelope: ItemEnvelope<Organization> = Self::parse_response(response).await?;
        Ok(envelope.data)
    }

    async fn find_person_by_email(&self, email: &str) -> Result<Option<Person>, CrmError> {
        let response = self
            .get("/api/v1/persons/search")
            .query(&[("email", email), ("exact", "true")])
            .send()
            .await?;
        let list: ItemList<Person> = Self::parse_response(response).await?;
        Ok(list.items.into_iter().next())
    }

    async fn create_person(
        &self,
        name: &str,
        email: &str,
        org_id: DbId,
        status: PipelineStatus,
    ) -> Result<Person, CrmError> {
        let mut body = serde_json::json!({
            "name": name,
            "email": email,
            "org_id": org_id,
        });
        body[self.status_field.field_key()] = serde_json::json!(self.option_id(status)?);
        let response = self.post("/api/v1/persons").json(&body).send().await?;
        let envelope: ItemEnvelope<Person> = Self::parse_response(response).await?;
        Ok(envelope.data)
    }

    async fn update_person_status(
        &self,
        person_id: DbId,
        status: PipelineStatus,
    ) -> Result<(), CrmError> {
        let mut body = serde_json::json!({});
        body[self.status_field.field_key()] = serde_json::json!(self.option_id(status)?);
        let response = self
            .put(&format!("/api/v1/persons/{person_id}"))
            .json(&body)
            .send()
            .await?;
        Self::check_status(response).await
    }

    async fn add_note(
        &self,
        content: &str,
        person_id: DbId,
        org_id: Option<DbId>,
    ) -> Result<(), CrmError> {
        let body = serde_json::json!({
            "content": content,
            "person_id": person_id,
            "org_id": org_id,
        });
        let response = self.post("/api/v1/notes").json(&body).send().await?;
        Self::check_status(response).await
    }
}
