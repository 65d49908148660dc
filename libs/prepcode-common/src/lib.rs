pub mod redis;
pub mod types;
