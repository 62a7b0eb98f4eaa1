pub mod blob_service;
pub mod metrics_service;
pub mod model_service;
pub mod report_service;
