pub mod blob_service;
pub mod evaluation_service;
pub mod metrics_service;
pub mod model_service;
pub mod ranking_service;
pub mod report_service;
pub mod synthesis_service;
