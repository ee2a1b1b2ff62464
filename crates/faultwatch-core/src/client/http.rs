//! Thin HTTP wrapper every backend request goes through

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

use crate::error::{Error, Result};

/// HTTP client bound to one base URL.
///
/// Sends `Content-Type: application/json` on every request. There is no
/// timeout, retry or authentication layer.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
}

impl HttpClient {
    /// Create a client for `base_url`, e.g. `http://localhost:5000`
    pub fn new(base_url: &str) -> Result<Self> {
        Url::parse(base_url)?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder().default_headers(headers).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolve `path` against the base URL and attach `query`
    pub fn url(&self, path: &str, query: &[(&str, &str)]) -> Result<Url> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, path))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    /// GET `path` and decode the JSON response
    pub async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        let url = self.url(path, query)?;
        debug!(method = "GET", url = %url, "Sending request");

        let response = self.client.get(url).send().await?;
        Self::decode(response).await
    }

    /// POST `body` as JSON to `path` and decode the JSON response
    pub async fn post<B, T>(&self, path: &str, query: &[(&str, &str)], body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path, query)?;
        debug!(method = "POST", url = %url, "Sending request");

        let response = self.client.post(url).json(body).send().await?;
        Self::decode(response).await
    }

    /// POST `body` as JSON to `path`, only checking the status.
    ///
    /// The response body is discarded, so an empty or non-JSON 2xx succeeds.
    pub async fn post_status<B>(&self, path: &str, query: &[(&str, &str)], body: &B) -> Result<()>
    where
        B: Serialize + ?Sized,
    {
        let url = self.url(path, query)?;
        debug!(method = "POST", url = %url, "Sending request");

        let response = self.client.post(url).json(body).send().await?;
        Self::check_status(response).await?;
        Ok(())
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        let response = Self::check_status(response).await?;
        Ok(response.json::<T>().await?)
    }

    async fn check_status(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let url = response.url().clone();
        let body = response.text().await.unwrap_or_default();
        warn!(status = status.as_u16(), url = %url, "Backend returned an error status");
        Err(Error::Status {
            status: status.as_u16(),
            body,
        })
    }
}
