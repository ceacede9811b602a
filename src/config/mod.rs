/// Database configuration and connection management
pub mod database;

/// Reference data loading from reference.toml
pub mod reference;

/// HTTP server settings from environment variables
pub mod server;
