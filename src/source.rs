use anyhow::{Context, Result};
use tracing::info;

pub fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Reads page HTML from a URL or a local file.
pub async fn load_page_source(source: &str) -> Result<String> {
    if is_remote(source) {
        info!(url = source, "Fetching page");
        let resp = reqwest::get(source)
            .await
            .context("Failed to fetch URL")?
            .error_for_status()
            .context("Page request failed")?;
        let body = resp.bytes().await.context("Failed to read response body")?;
        return Ok(String::from_utf8_lossy(&body).to_string());
    }

    tokio::fs::read_to_string(source)
        .await
        .with_context(|| format!("Failed to read {}", source))
}
