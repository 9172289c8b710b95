// src/client.rs

//! Blocking HTTP client wrapper
//!
//! One place for timeouts and error mapping. Metadata requests (indexes,
//! recipes, signatures) get a 90 second budget; archive downloads get 300
//! seconds and are consumed as streams so the engine never buffers a full
//! archive in memory.

use crate::error::{Error, Result};
use reqwest::blocking::{Client, Response};
use std::time::Duration;
use tracing::debug;

/// Timeout for metadata-sized requests.
const HTTP_TIMEOUT: Duration = Duration::from_secs(90);

/// Timeout for archive downloads.
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(300);

pub struct HttpClient {
    client: Client,
    download_client: Client,
}

impl HttpClient {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::network(format!("failed to create HTTP client: {e}")))?;
        let download_client = Client::builder()
            .timeout(DOWNLOAD_TIMEOUT)
            .build()
            .map_err(|e| Error::network(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            download_client,
        })
    }

    /// Fetch a URL fully into memory. Non-2xx statuses are errors.
    pub fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| Error::network(format!("failed to fetch {url}: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::network(format!(
                "HTTP {} from {url}",
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .map_err(|e| Error::network(format!("failed to read response from {url}: {e}")))?;
        Ok(bytes.to_vec())
    }

    /// Open a streaming download. Returns the response (a `Read`) and the
    /// advertised content length, if any.
    pub fn get_stream(&self, url: &str) -> Result<(Response, Option<u64>)> {
        debug!("GET (stream) {}", url);
        let response = self
            .download_client
            .get(url)
            .send()
            .map_err(|e| Error::network(format!("failed to start download of {url}: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::network(format!(
                "HTTP {} from {url}",
                response.status()
            )));
        }

        let len = response.content_length();
        Ok((response, len))
    }
}
