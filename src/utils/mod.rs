pub mod multipart;
pub mod text;
