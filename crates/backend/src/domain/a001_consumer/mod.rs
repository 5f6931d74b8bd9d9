pub mod loader;
pub mod repository;
pub mod service;
