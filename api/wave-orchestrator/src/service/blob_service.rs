use crate::config::environment::AppConfig;
use reqwest::Client;
use std::time::Duration;

pub fn spec_blob_path(project_id: &str) -> String {
    format!("specs/{project_id}.md")
}

pub fn scorecard_blob_path(project_id: &str) -> String {
    format!("scorecards/{project_id}.json")
}

pub fn artifact_blob_path(wave_number: u32, artifact_id: &str) -> String {
    format!("artifacts/wave-{wave_number}/{artifact_id}.html")
}

/// Write a document to the blob store. A missing BLOB_STORE_BASE_URL keeps
/// the path bookkeeping but skips the write, so the service still runs in
/// environments without an object store.
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
    let client = build_client(config)?;
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

pub async fn get_text(config: &AppConfig, path: &str) -> Result<Option<String>, String> {
    let Some(base_url) = &config.blob_store_base_url else {
        return Ok(None);
    };
    let url = format!("{}/{}", base_url.trim_end_matches('/'), path);
    let client = build_client(config)?;
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

fn build_client(config: &AppConfig) -> Result<Client, String> {
    Client::builder()
        .timeout(Duration::from_millis(config.dispatch_timeout_ms.max(1) as u64))
        .build()
        .map_err(|e| format!("failed to build http client: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blob_paths_are_project_scoped() {
        assert_eq!(spec_blob_path("proj-1"), "specs/proj-1.md");
        assert_eq!(scorecard_blob_path("proj-1"), "scorecards/proj-1.json");
        assert_eq!(
            artifact_blob_path(2, "w2-a1"),
            "artifacts/wave-2/w2-a1.html"
        );
    }
}
