pub mod access_service;
pub mod course_service;
pub mod entitlement_service;
pub mod profile_service;
pub mod progress_service;
pub mod quiz_service;
