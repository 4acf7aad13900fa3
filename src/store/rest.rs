/// Hosted row-store adapter (Supabase/PostgREST dialect)
///
/// Speaks the PostgREST query language: equality filters become
/// `?field=eq.value` params, ordering is `?order=field.desc`, and writes ask
/// for `Prefer: return=representation` so the response body carries the
/// post-write rows. Authentication is the project API key sent both as
/// `apikey` and as a bearer token.

use async_trait::async_trait;
use reqwest::{header::AUTHORIZATION, Method, RequestBuilder, Response};

use super::{Row, RowStore, StoreError};

#[derive(Debug, Clone)]
pub struct RestRowStore {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl RestRowStore {
    /// Create an adapter for the project at `supabase_url` using `api_key`
    /// (service-role key for backend deployments)
    pub fn new(supabase_url: &str, api_key: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: format!("{}/rest/v1", supabase_url.trim_end_matches('/')),
            api_key: api_key.to_string(),
        }
    }

    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}/{}", self.base_url, table))
            .header("apikey", &self.api_key)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
    }

    async fn read_rows(table: &str, resp: Response) -> Result<Vec<Row>, StoreError> {
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        if !status.is_success() {
            tracing::error!("row store rejected request on '{}': {} {}", table, status, body);
            return Err(StoreError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| StoreError::Malformed(e.to_string()))
    }

    fn eq_params(matches: &[(String, String)]) -> Vec<(String, String)> {
        matches
            .iter()
            .map(|(field, value)| (field.clone(), format!("eq.{value}")))
            .collect()
    }
}

#[async_trait]
impl RowStore for RestRowStore {
    async fn select(
        &self,
        table: &str,
        filters: &[(String, String)],
        order: Option<&str>,
    ) -> Result<Vec<Row>, StoreError> {
        let mut params = Self::eq_params(filters);
        if let Some(directive) = order {
            params.push(("order".to_string(), directive.to_string()));
        }

        let resp = self
            .request(Method::GET, table)
            .query(&params)
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        Self::read_rows(table, resp).await
    }

    async fn insert(&self, table: &str, rows: Vec<Row>) -> Result<Vec<Row>, StoreError> {
        let resp = self
            .request(Method::POST, table)
            .header("Prefer", "return=representation")
            .json(&rows)
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        Self::read_rows(table, resp).await
    }

    async fn update(
        &self,
        table: &str,
        matches: &[(String, String)],
        patch: Row,
    ) -> Result<Vec<Row>, StoreError> {
        let resp = self
            .request(Method::PATCH, table)
            .header("Prefer", "return=representation")
            .query(&Self::eq_params(matches))
            .json(&patch)
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        Self::read_rows(table, resp).await
    }

    async fn delete(&self, table: &str, matches: &[(String, String)]) -> Result<(), StoreError> {
        let resp = self
            .request(Method::DELETE, table)
            .query(&Self::eq_params(matches))
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::error!("row store rejected delete on '{}': {} {}", table, status, body);
            return Err(StoreError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}
