pub mod connection;
pub mod endpoints;

// Re-export the pieces callers usually need.
pub use connection::{ApiConnectionError, GeminiClient};
pub use endpoints::DEFAULT_MODEL;
