pub mod loader;
pub mod models;

pub use loader::load_config;
pub use models::{
    validate_backend, AdminConfig, ClientConfig, Config, LoggingConfig, PoolConfig,
    ServerConfig,
};
