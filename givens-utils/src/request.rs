use anyhow::{anyhow, Result};
use reqwest::{Client, Response};
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(120);

async fn ensure_success(url: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(anyhow!(
        "Request to {} failed (status: {}, body: {})",
        url,
        status.as_u16(),
        body
    ))
}

/// Fetches `url` and returns the whole response body.
pub async fn fetch_bytes(url: &str) -> Result<Vec<u8>> {
    let client = Client::builder().timeout(TIMEOUT).build()?;
    let response = ensure_success(url, client.get(url).send().await?).await?;
    Ok(response.bytes().await?.to_vec())
}
