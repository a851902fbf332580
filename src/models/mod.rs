pub mod generation;
pub mod question;
pub mod user;
