pub mod chapter;
pub mod course;
pub mod profile;
pub mod progress;
pub mod quiz;
pub mod university;
