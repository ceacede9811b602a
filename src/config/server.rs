//! Server configuration from environment variables.
//!
//! Values come from the process environment, which `main` populates from
//! `.env` before anything else runs.

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8000";

/// Gets the listen address from `BIND_ADDR`, falling back to a local default.
#[must_use]
pub fn get_bind_addr() -> String {
    std::env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string())
}
