pub mod config;
pub mod error;

pub use config::KirokuConfig;
pub use error::ConfigError;
