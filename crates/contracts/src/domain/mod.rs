pub mod a001_consumer;
pub mod common;
