pub mod a001_consumer;
