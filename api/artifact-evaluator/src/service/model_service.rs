use crate::config::environment::AppConfig;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenUsage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Completion {
    pub text: String,
    #[serde(default)]
    pub usage: TokenUsage,
}

pub async fn complete(config: &AppConfig, prompt: &str) -> Result<Completion, String> {
    let Some(base_url) = &config.model_base_url else {
        return Err("model endpoint is not configured".to_string());
    };
    let url = format!("{}/v1/completions", base_url.trim_end_matches('/'));
    let client = Client::builder()
        .timeout(Duration::from_millis(config.model_timeout_ms.max(1) as u64))
        .build()
        .map_err(|e| format!("failed to build http client: {e}"))?;

    let resp = client
        .post(&url)
        .json(&json!({
            "prompt": prompt,
            "max_tokens": config.model_max_tokens,
        }))
        .send()
        .await
        .map_err(|e| format!("model request failed: {e}"))?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        return Err(format!("model error {}: {}", status, truncate(&body, 320)));
    }

    resp.json::<Completion>()
        .await
        .map_err(|e| format!("invalid model response: {e}"))
}

pub fn truncate(value: &str, max_chars: usize) -> String {
    let mut chars = value.chars();
    let truncated: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{truncated}...")
    } else {
        truncated
    }
}
