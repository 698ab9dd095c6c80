pub mod course_dto;
pub mod profile_dto;
pub mod quiz_dto;
