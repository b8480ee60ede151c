pub mod availability;
pub mod grading_service;
pub mod result_service;
pub mod test_service;
pub mod upstream_service;
pub mod validation;
