//! The ratings-and-reviews API client.

use async_trait::async_trait;
use review_harvest_fetch::{MetricsOracle, ReviewTransport, TransportError};
use review_harvest_models::{Document, ParamKey, QueryParameters, ReviewPage, filter::ALL};
use serde::Deserialize;

use crate::retry;

/// Production API host.
pub const DEFAULT_BASE_URL: &str = "https://api-pf.ratingsandreviews-beauty.com";

/// Environment variable overriding the API host.
pub const BASE_URL_ENV: &str = "REVIEW_API_URL";

/// Environment variable carrying the account token.
pub const TOKEN_ENV: &str = "REVIEW_API_TOKEN";

/// API-imposed ceiling on the `rows` page-size parameter. Callers clamp
/// to this before handing a page size to the fetch engine.
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Errors building an [`ApiClient`].
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// A required environment variable is missing.
    #[error("environment variable {0} is not set")]
    MissingEnv(&'static str),

    /// The underlying HTTP client could not be built.
    #[error("HTTP client build failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Account quota snapshot from `/quotas`.
///
/// The API reports these fields loosely typed (numbers or strings, spaced
/// key names), so they are carried as raw JSON values for display.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Quotas {
    /// Documents consumed so far in the billing period.
    #[serde(default, rename = "used volume")]
    pub used_volume: Option<serde_json::Value>,
    /// Documents still available.
    #[serde(default, rename = "remaining volume")]
    pub remaining_volume: Option<serde_json::Value>,
    /// Total allowance.
    #[serde(default)]
    pub quota: Option<serde_json::Value>,
    /// When the current allowance expires.
    #[serde(default, rename = "end date")]
    pub end_date: Option<serde_json::Value>,
}

/// Metrics for a filter combination from `/metrics`.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Metrics {
    /// Number of documents the filter criteria match.
    #[serde(default, rename = "nbDocs")]
    pub nb_docs: u64,
}

/// Client for the ratings-and-reviews REST API.
///
/// Cheap to clone is not a goal; one client per session context. All
/// endpoints unwrap the API's top-level `result` envelope and surface a
/// missing envelope as [`TransportError::MissingPayload`].
#[derive(Debug)]
pub struct ApiClient {
    base_url: String,
    token: String,
    client: reqwest::Client,
}

impl ApiClient {
    /// Creates a client for the given host and token.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Http`] if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Result<Self, ClientError> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        let client = reqwest::Client::builder().default_headers(headers).build()?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            token: token.into(),
            client,
        })
    }

    /// Creates a client from `REVIEW_API_URL` (optional) and
    /// `REVIEW_API_TOKEN` (required).
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::MissingEnv`] if the token variable is unset.
    pub fn from_env() -> Result<Self, ClientError> {
        let base_url =
            std::env::var(BASE_URL_ENV).unwrap_or_else(|_| DEFAULT_BASE_URL.to_owned());
        let token = std::env::var(TOKEN_ENV).map_err(|_| ClientError::MissingEnv(TOKEN_ENV))?;
        Self::new(base_url, token)
    }

    /// GETs an endpoint and unwraps the `result` envelope.
    async fn get_result(
        &self,
        endpoint: &str,
        params: &QueryParameters,
    ) -> Result<serde_json::Value, TransportError> {
        let url = format!("{}{endpoint}", self.base_url);
        log::debug!("GET {endpoint}");

        let body = retry::send_json(|| {
            self.client
                .get(&url)
                .query(&params.to_pairs())
                // Token goes last and stays out of the logs.
                .query(&[(ParamKey::Token.as_ref(), self.token.as_str())])
        })
        .await?;

        body.get("result").cloned().ok_or_else(|| {
            TransportError::MissingPayload(format!("no result envelope from {endpoint}"))
        })
    }

    /// Fetches the account quota snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the request fails or the payload does
    /// not decode.
    pub async fn quotas(&self) -> Result<Quotas, TransportError> {
        let result = self.get_result("/quotas", &QueryParameters::new()).await?;
        serde_json::from_value(result).map_err(|e| TransportError::Decode(e.to_string()))
    }

    /// Fetches the category taxonomy as raw JSON (categories mapped to
    /// their subcategories).
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the request fails.
    pub async fn categories(&self) -> Result<serde_json::Value, TransportError> {
        self.get_result("/categories", &QueryParameters::new()).await
    }

    /// Lists brands, optionally narrowed by category/subcategory.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the request fails.
    pub async fn brands(
        &self,
        category: Option<&str>,
        subcategory: Option<&str>,
    ) -> Result<Vec<String>, TransportError> {
        let mut params = QueryParameters::new();
        set_if_restricted(&mut params, ParamKey::Category, category);
        set_if_restricted(&mut params, ParamKey::Subcategory, subcategory);
        let result = self.get_result("/brands", &params).await?;
        Ok(string_list(&result, "brands"))
    }

    /// Lists the available countries.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the request fails.
    pub async fn countries(&self) -> Result<Vec<String>, TransportError> {
        let result = self.get_result("/countries", &QueryParameters::new()).await?;
        Ok(string_list(&result, "countries"))
    }

    /// Lists review sources, optionally narrowed by country.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the request fails.
    pub async fn sources(&self, country: Option<&str>) -> Result<Vec<String>, TransportError> {
        let mut params = QueryParameters::new();
        if let Some(country) = country {
            params.set(ParamKey::Country, country);
        }
        let result = self.get_result("/sources", &params).await?;
        Ok(string_list(&result, "sources"))
    }

    /// Lists the available markets.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the request fails.
    pub async fn markets(&self) -> Result<Vec<String>, TransportError> {
        let result = self.get_result("/markets", &QueryParameters::new()).await?;
        Ok(string_list(&result, "markets"))
    }

    /// Lists attribute tags valid for the given narrowing filters.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the request fails.
    pub async fn attributes(
        &self,
        category: Option<&str>,
        subcategory: Option<&str>,
        brands: &[String],
    ) -> Result<Vec<String>, TransportError> {
        let mut params = QueryParameters::new();
        set_if_restricted(&mut params, ParamKey::Category, category);
        set_if_restricted(&mut params, ParamKey::Subcategory, subcategory);
        params.set_list(ParamKey::Brand, brands);
        let result = self.get_result("/attributes", &params).await?;
        Ok(string_list(&result, "attributes"))
    }

    /// Lists product records matching the filter criteria.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the request fails.
    pub async fn products(
        &self,
        criteria: &QueryParameters,
    ) -> Result<Vec<serde_json::Value>, TransportError> {
        let result = self.get_result("/products", criteria).await?;
        Ok(array_field(&result, "products"))
    }

    /// Fetches document metrics for a filter combination.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the request fails or the payload does
    /// not decode.
    pub async fn metrics(&self, criteria: &QueryParameters) -> Result<Metrics, TransportError> {
        let result = self.get_result("/metrics", criteria).await?;
        serde_json::from_value(result).map_err(|e| TransportError::Decode(e.to_string()))
    }

    /// Fetches one page of reviews. `params` must already carry the
    /// cursor and page-size fields.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the request fails.
    pub async fn reviews_page(
        &self,
        params: &QueryParameters,
    ) -> Result<ReviewPage, TransportError> {
        let result = self.get_result("/reviews", params).await?;

        let documents = result
            .get("docs")
            .and_then(serde_json::Value::as_array)
            .map(|docs| docs.iter().cloned().map(Document::new).collect())
            .unwrap_or_default();

        let next_cursor = result
            .get("nextCursorMark")
            .and_then(serde_json::Value::as_str)
            .map(ToOwned::to_owned);

        Ok(ReviewPage {
            documents,
            next_cursor,
        })
    }
}

#[async_trait]
impl ReviewTransport for ApiClient {
    async fn fetch_page(&self, params: &QueryParameters) -> Result<ReviewPage, TransportError> {
        self.reviews_page(params).await
    }
}

#[async_trait]
impl MetricsOracle for ApiClient {
    async fn expected_total(&self, params: &QueryParameters) -> Result<u64, TransportError> {
        Ok(self.metrics(params).await?.nb_docs)
    }
}

/// Sets a narrowing parameter unless it is absent or the `ALL` sentinel.
fn set_if_restricted(params: &mut QueryParameters, key: ParamKey, value: Option<&str>) {
    if let Some(value) = value
        && value != ALL
        && !value.is_empty()
    {
        params.set(key, value);
    }
}

/// Extracts a string array either from `result[key]` or from a bare-array
/// `result`.
fn string_list(result: &serde_json::Value, key: &str) -> Vec<String> {
    array_of(result, key)
        .map(|items| {
            items
                .iter()
                .filter_map(serde_json::Value::as_str)
                .map(ToOwned::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

/// Extracts a record array either from `result[key]` or from a bare-array
/// `result`.
fn array_field(result: &serde_json::Value, key: &str) -> Vec<serde_json::Value> {
    array_of(result, key).cloned().unwrap_or_default()
}

fn array_of<'a>(result: &'a serde_json::Value, key: &str) -> Option<&'a Vec<serde_json::Value>> {
    result
        .get(key)
        .and_then(serde_json::Value::as_array)
        .or_else(|| result.as_array())
}

#[cfg(test)]
mod tests {
    use review_harvest_fetch::engine::CURSOR_START;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client_for(server: &MockServer) -> ApiClient {
        ApiClient::new(server.uri(), "secret-token").unwrap()
    }

    #[tokio::test]
    async fn metrics_reports_the_expected_total() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/metrics"))
            .and(query_param("token", "secret-token"))
            .and(query_param("brand", "AVENE"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"result": {"nbDocs": 4321}})),
            )
            .mount(&server)
            .await;

        let client = client_for(&server);
        let criteria = QueryParameters::new().with(ParamKey::Brand, "AVENE");
        let total = client.expected_total(&criteria).await.unwrap();
        assert_eq!(total, 4321);
    }

    #[tokio::test]
    async fn reviews_page_decodes_docs_and_cursor() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/reviews"))
            .and(query_param("cursorMark", CURSOR_START))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": {
                    "docs": [{"id": "r-1"}, {"id": "r-2"}],
                    "nextCursorMark": "AoIIP4AAACxQcm9maWxlCg=="
                }
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let params = QueryParameters::new().with_cursor(CURSOR_START);
        let page = client.reviews_page(&params).await.unwrap();

        assert_eq!(page.documents.len(), 2);
        assert_eq!(page.documents[0].id(), Some("r-1"));
        assert_eq!(page.next_cursor.as_deref(), Some("AoIIP4AAACxQcm9maWxlCg=="));
    }

    #[tokio::test]
    async fn missing_result_envelope_is_a_missing_payload() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/reviews"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"docs": []})))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client
            .reviews_page(&QueryParameters::new())
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::MissingPayload(_)));
    }

    #[tokio::test]
    async fn client_errors_are_permanent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/metrics"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client.metrics(&QueryParameters::new()).await.unwrap_err();
        assert!(matches!(err, TransportError::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn brand_lists_unwrap_either_shape() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/brands"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"result": {"brands": ["AVENE", "BIODERMA"]}})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/countries"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"result": ["France", "Italy"]})),
            )
            .mount(&server)
            .await;

        let client = client_for(&server);
        assert_eq!(client.brands(None, None).await.unwrap(), vec!["AVENE", "BIODERMA"]);
        assert_eq!(client.countries().await.unwrap(), vec!["France", "Italy"]);
    }
}
