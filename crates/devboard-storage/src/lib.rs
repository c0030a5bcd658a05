//! Durable task storage: a JSON file rewritten atomically on every save.

pub mod json_file_store;

pub use json_file_store::JsonFileStore;
