pub mod download;
pub mod pdf;
