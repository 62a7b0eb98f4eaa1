use crate::config::environment::AppConfig;
use redis::Client as RedisClient;

#[derive(Debug, Clone)]
pub struct InfraClients {
    pub redis: RedisClient,
}

pub const RUNS_INDEX_KEY: &str = "runs:index";
pub const RUNS_COLLECTION: &str = "runs";

pub async fn init_infra(config: &AppConfig) -> Result<Option<InfraClients>, String> {
    let Some(redis_url) = &config.redis_url else {
        return Ok(None);
    };

    let redis =
        RedisClient::open(redis_url.clone()).map_err(|e| format!("redis init failed: {e}"))?;
    Ok(Some(InfraClients { redis }))
}
