use crate::config::environment::AppConfig;
use reqwest::Client;
use std::time::Duration;

pub async fn put_text(
    config: &AppConfig,
    path: &str,
    content: &str,
    content_type: &str,
) -> Result<(), String> {
    let Some(base_url) = &config.blob_store_base_url else {
        return Ok(());
    };
    let url = format!("{}/{}", base_url.trim_end_matches('/'), path);
    let client = Client::builder()
        .timeout(Duration::from_millis(config.blob_timeout_ms.max(1) as u64))
        .build()
        .map_err(|e| format!("failed to build http client: {e}"))?;
    let resp = client
        .put(&url)
        .header("content-type", content_type)
        .body(content.to_string())
        .send()
        .await
        .map_err(|e| format!("blob put failed: {e}"))?;
    if !resp.status().is_success() {
        return Err(format!("blob put returned status {}", resp.status()));
    }
    Ok(())
}
