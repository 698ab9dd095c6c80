pub mod courses;
pub mod dashboard;
pub mod health;
pub mod learning;
pub mod profile;
