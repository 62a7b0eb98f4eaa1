use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub rust_env: String,
    pub api_host: String,
    pub api_port: u16,
    pub redis_url: Option<String>,
    pub public_base_url: String,
    pub generator_base_url: String,
    pub analyzer_base_url: String,
    pub blob_store_base_url: Option<String>,
    pub generator_count_per_wave: u32,
    pub generation_timeout_ms: i64,
    pub analysis_timeout_ms: i64,
    pub dispatch_timeout_ms: i64,
    pub max_retries: u32,
    pub unit_token_price_usd: f64,
    pub default_tokens_per_artifact: u64,
    pub viability_threshold: f64,
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
            redis_url: env::var("REDIS_URL").ok(),
            public_base_url: read_optional_string("PUBLIC_BASE_URL", "http://127.0.0.1:8081"),
            generator_base_url: read_optional_string(
                "GENERATOR_BASE_URL",
                "http://127.0.0.1:8082",
            ),
            analyzer_base_url: read_optional_string("ANALYZER_BASE_URL", "http://127.0.0.1:8083"),
            blob_store_base_url: env::var("BLOB_STORE_BASE_URL").ok(),
            generator_count_per_wave: read_optional_u32("GENERATOR_COUNT_PER_WAVE", 3)?,
            generation_timeout_ms: read_optional_i64("GENERATION_TIMEOUT_MS", 180_000)?,
            analysis_timeout_ms: read_optional_i64("ANALYSIS_TIMEOUT_MS", 300_000)?,
            dispatch_timeout_ms: read_optional_i64("DISPATCH_TIMEOUT_MS", 10_000)?,
            max_retries: read_optional_u32("MAX_RETRIES", 2)?,
            unit_token_price_usd: read_optional_f64("UNIT_TOKEN_PRICE_USD", 0.000002)?,
            default_tokens_per_artifact: read_optional_u64("DEFAULT_TOKENS_PER_ARTIFACT", 2000)?,
            viability_threshold: read_optional_f64("VIABILITY_THRESHOLD", 80.0)?,
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

fn read_optional_u64(key: &str, default: u64) -> Result<u64, String> {
    match env::var(key) {
        Ok(v) => v.parse::<u64>().map_err(|e| format!("invalid {key}: {e}")),
        Err(_) => Ok(default),
    }
}

fn read_optional_f64(key: &str, default: f64) -> Result<f64, String> {
    match env::var(key) {
        Ok(v) => v.parse::<f64>().map_err(|e| format!("invalid {key}: {e}")),
        Err(_) => Ok(default),
    }
}

fn read_optional_string(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn load_dotenv_layers() {
    for path in [".env", "../.env", "../../.env"] {
        let _ = dotenvy::from_path_override(path);
    }
}
