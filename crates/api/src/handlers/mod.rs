pub mod admin;
pub mod jobs;
