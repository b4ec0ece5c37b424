//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! settings.toml
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → MinterConfig (validated, immutable)
//!     → passed by reference to the runner and clients
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no global settings object
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{FilesConfig, FromTo, MinterConfig, NamesConfig, NodeConfig, ObservabilityConfig, Settings};
