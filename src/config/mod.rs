//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → CLI overrides (main.rs)
//!     → validation.rs (semantic checks)
//!     → CaptureConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once the listener starts; the read timeout is
//!   shared read-only by every session
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod duration;
pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{CaptureConfig, ListenerConfig, LogFormat, ObservabilityConfig, SessionConfig};
pub use validation::{validate_config, ValidationError};
