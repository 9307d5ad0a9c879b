//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! ServiceOption list / builder calls / TOML file (loader.rs)
//!     → ServiceConfigBuilder (explicit optionals, last write wins)
//!     → build() fills defaults
//!     → ServiceConfig (immutable, shared via Arc)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once built
//! - All fields except the name have defaults
//! - No semantic validation beyond defaulting

pub mod loader;
pub mod schema;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{ServiceConfig, ServiceConfigBuilder, ServiceOption};
