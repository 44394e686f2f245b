//! Configuration for the feed reporter: typed config structs plus a loader
//! that reads TOML/JSON/YAML files and applies environment overrides.

pub mod loader;
pub mod types;

pub use loader::ConfigLoader;
pub use types::{Config, FeedsConfig, ReporterConfig, SourcesConfig, TelemetryConfig};
