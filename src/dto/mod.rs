pub mod admin_dto;
pub mod attempt_dto;
