use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub rust_env: String,
    pub api_host: String,
    pub api_port: u16,
    pub model_base_url: Option<String>,
    pub model_timeout_ms: i64,
    pub model_max_tokens: u32,
    pub blob_store_base_url: Option<String>,
    pub blob_timeout_ms: i64,
    pub report_timeout_ms: i64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        load_dotenv_layers();
        Ok(Self {
            rust_env: read_var("RUST_ENV")?,
            api_host: read_var("API_HOST")?,
            api_port: read_var("API_PORT")?
                .parse::<u16>()
                .map_err(|e| format!("invalid API_PORT: {e}"))?,
            model_base_url: env::var("MODEL_BASE_URL").ok(),
            model_timeout_ms: read_optional_i64("MODEL_TIMEOUT_MS", 150_000)?,
            model_max_tokens: read_optional_u32("MODEL_MAX_TOKENS", 4096)?,
            blob_store_base_url: env::var("BLOB_STORE_BASE_URL").ok(),
            blob_timeout_ms: read_optional_i64("BLOB_TIMEOUT_MS", 10_000)?,
            report_timeout_ms: read_optional_i64("REPORT_TIMEOUT_MS", 10_000)?,
        })
    }
}

fn read_var(key: &str) -> Result<String, String> {
    env::var(key).map_err(|_| format!("missing required env var: {key}"))
}

fn read_optional_i64(key: &str, default: i64) -> Result<i64, String> {
    match env::var(key) {
        Ok(v) => v.parse::<i64>().map_err(|e| format!("invalid {key}: {e}")),
        Err(_) => Ok(default),
    }
}

fn read_optional_u32(key: &str, default: u32) -> Result<u32, String> {
    match env::var(key) {
        Ok(v) => v.parse::<u32>().map_err(|e| format!("invalid {key}: {e}")),
        Err(_) => Ok(default),
    }
}

fn load_dotenv_layers() {
    for path in [".env", "../.env", "../../.env"] {
        let _ = dotenvy::from_path_override(path);
    }
}
