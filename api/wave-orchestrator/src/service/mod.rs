pub mod blob_service;
pub mod cost_service;
pub mod dispatch_service;
pub mod metrics_service;
pub mod prompt_service;
pub mod termination_service;
pub mod timeout_service;
