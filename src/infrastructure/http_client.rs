use crate::error::Result;
use std::time::Duration;

/// Shared client for every outbound vendor call.
pub fn build_client() -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .pool_max_idle_per_host(8)
        .connect_timeout(Duration::from_secs(5))
        .timeout(Duration::from_secs(20))
        .build()?;
    Ok(client)
}

/// Turns a non-2xx response into an error and returns the body otherwise.
pub async fn response_text(response: reqwest::Response) -> Result<String> {
    let response = response.error_for_status()?;
    Ok(response.text().await?)
}
