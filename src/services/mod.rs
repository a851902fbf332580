pub mod ai_service;
pub mod exam_service;
pub mod gateway_service;
pub mod identity_service;
pub mod marks_service;
pub mod pdf_service;
pub mod prompts;
pub mod quota_service;
pub mod scheduler;
pub mod user_service;
