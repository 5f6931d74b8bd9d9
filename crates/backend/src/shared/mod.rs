pub mod config;
pub mod data;
pub mod export;
pub mod files;
pub mod format;
