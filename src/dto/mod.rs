pub mod exam_dto;
pub mod user_dto;
