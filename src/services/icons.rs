//! Best-effort download of coin icon assets.
//!
//! Icons are enrichment only: a failed download is logged by the caller and
//! never affects the ingestion outcome. Each coin id is fetched at most once
//! because an existing file short-circuits the download.

use std::path::Path;

use reqwest::Client;
use tokio::fs;

/// Download `url` to `path` unless the file already exists.
/// Returns true when a new file was written.
pub async fn download_icon_if_missing(
    client: &Client,
    url: &str,
    path: &str,
) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
    if fs::try_exists(path).await.unwrap_or(false) {
        return Ok(false);
    }

    if let Some(parent) = Path::new(path).parent() {
        fs::create_dir_all(parent).await?;
    }

    let response = client.get(url).send().await?;
    if !response.status().is_success() {
        return Err(format!("icon download failed with status {}", response.status()).into());
    }

    let bytes = response.bytes().await?;
    fs::write(path, &bytes).await?;

    tracing::debug!("Saved icon asset to {}", path);

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn existing_file_short_circuits_without_network() {
        let dir = std::env::temp_dir().join("cryptofolio-icon-test");
        fs::create_dir_all(&dir).await.unwrap();
        let path = dir.join("bitcoin.png");
        fs::write(&path, b"png-bytes").await.unwrap();

        // Unroutable URL: the function must return before any request
        let client = Client::new();
        let written = download_icon_if_missing(
            &client,
            "http://invalid.invalid/icon.png",
            path.to_str().unwrap(),
        )
        .await
        .unwrap();

        assert!(!written);
        fs::remove_file(&path).await.unwrap();
    }
}
