//! Configuration loading and schema

pub mod file_config;
pub mod loader;

pub use file_config::{EngineConfig, FileConfig, ProviderConfig, StorageConfig};
pub use loader::ConfigLoader;
