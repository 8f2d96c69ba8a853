//! SPARQL 1.1 protocol client.

use std::time::Duration;

use async_trait::async_trait;
use backoff::ExponentialBackoff;
use backoff::backoff::Backoff;
use reqwest::Client;
use reqwest::header::ACCEPT;
use tracing::{debug, warn};

use crate::{Row, StoreError, TripleStore, parse_select_results};

/// Media type requested for SELECT results.
pub const SPARQL_RESULTS_JSON: &str = "application/sparql-results+json";

/// Header that lifts mu-authorization access checks for the request.
pub const SUDO_HEADER: &str = "mu-auth-sudo";

/// Default endpoint inside a mu.semte.ch stack.
pub const DEFAULT_ENDPOINT: &str = "http://database:8890/sparql";

/// Builder for [`SparqlClient`].
pub struct SparqlClientBuilder {
    endpoint: String,
    connect_timeout: Duration,
    request_timeout: Duration,
    sudo: bool,
    max_retries: u32,
    retry_interval: Duration,
}

impl SparqlClientBuilder {
    /// Per-request timeout (covers the whole response).
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Send `mu-auth-sudo: true` on every request.
    pub fn sudo(mut self, sudo: bool) -> Self {
        self.sudo = sudo;
        self
    }

    /// Retry transient failures up to `retries` times. Zero disables retries.
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// First wait between retries; later waits grow exponentially.
    pub fn retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval;
        self
    }

    pub fn build(self) -> Result<SparqlClient, StoreError> {
        let http = Client::builder()
            .connect_timeout(self.connect_timeout)
            .timeout(self.request_timeout)
            .build()
            .map_err(|e| StoreError::Client(e.to_string()))?;

        Ok(SparqlClient {
            http,
            endpoint: self.endpoint,
            sudo: self.sudo,
            max_retries: self.max_retries,
            retry_interval: self.retry_interval,
        })
    }
}

/// Client for a SPARQL 1.1 endpoint.
pub struct SparqlClient {
    http: Client,
    endpoint: String,
    sudo: bool,
    max_retries: u32,
    retry_interval: Duration,
}

impl SparqlClient {
    /// Start building a client for the given endpoint URL.
    pub fn builder(endpoint: impl Into<String>) -> SparqlClientBuilder {
        SparqlClientBuilder {
            endpoint: endpoint.into(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(300),
            sudo: false,
            max_retries: 0,
            retry_interval: Duration::from_millis(500),
        }
    }

    /// Get the endpoint URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Run a SELECT query.
    pub async fn select(&self, query: &str) -> Result<Vec<Row>, StoreError> {
        debug!(query = %query, "executing SPARQL query");
        let body = self
            .post_with_retry("select", "query", query, Some(SPARQL_RESULTS_JSON))
            .await?;
        parse_select_results(&body)
    }

    /// Run a SPARQL update.
    pub async fn update(&self, update: &str) -> Result<(), StoreError> {
        debug!(update = %update, "executing SPARQL update");
        self.post_with_retry("update", "update", update, None)
            .await?;
        Ok(())
    }

    async fn post_with_retry(
        &self,
        operation: &'static str,
        field: &str,
        text: &str,
        accept: Option<&str>,
    ) -> Result<String, StoreError> {
        let mut backoff = ExponentialBackoff {
            current_interval: self.retry_interval,
            initial_interval: self.retry_interval,
            max_interval: Duration::from_secs(30),
            max_elapsed_time: None,
            ..Default::default()
        };

        let mut attempt = 0;
        loop {
            let result = self.post(field, text, accept).await;
            match result {
                Ok(body) => return Ok(body),
                Err(ref e) if e.is_transient() && attempt < self.max_retries => {
                    attempt += 1;
                    let wait = backoff.next_backoff().unwrap_or(backoff.max_interval);
                    warn!(
                        operation,
                        attempt,
                        wait_ms = wait.as_millis() as u64,
                        error = %e,
                        "transient SPARQL error, retrying"
                    );
                    tokio::time::sleep(wait).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn post(
        &self,
        field: &str,
        text: &str,
        accept: Option<&str>,
    ) -> Result<String, StoreError> {
        let mut request = self.http.post(&self.endpoint).form(&[(field, text)]);
        if let Some(accept) = accept {
            request = request.header(ACCEPT, accept);
        }
        if self.sudo {
            request = request.header(SUDO_HEADER, "true");
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(StoreError::Endpoint {
                status: status.as_u16(),
                body,
            });
        }

        Ok(body)
    }
}

#[async_trait]
impl TripleStore for SparqlClient {
    async fn execute_read(&self, query: &str) -> Result<Vec<Row>, StoreError> {
        self.select(query).await
    }

    async fn execute_write(&self, update: &str) -> Result<(), StoreError> {
        self.update(update).await
    }
}
