use crate::config::environment::AppConfig;
use reqwest::Client;
use std::time::Duration;

pub async fn get_text(config: &AppConfig, path: &str) -> Result<Option<String>, String> {
    let Some(base_url) = &config.blob_store_base_url else {
        return Ok(None);
    };
    let url = format!("{}/{}", base_url.trim_end_matches('/'), path);
    let client = Client::builder()
        .timeout(Duration::from_millis(config.blob_timeout_ms.max(1) as u64))
        .build()
        .map_err(|e| format!("failed to build http client: {e}"))?;
    let resp = client
        .get(&url)
        .send()
        .await
        .map_err(|e| format!("blob get failed: {e}"))?;
    if resp.status().as_u16() == 404 {
        return Ok(None);
    }
    if !resp.status().is_success() {
        return Err(format!("blob get returned status {}", resp.status()));
    }
    let body = resp
        .text()
        .await
        .map_err(|e| format!("blob body read failed: {e}"))?;
    Ok(Some(body))
}
