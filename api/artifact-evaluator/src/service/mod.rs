pub mod blob_service;
pub mod judge_service;
pub mod linter_service;
pub mod metrics_service;
pub mod model_service;
pub mod test_registry;
