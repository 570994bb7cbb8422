//! Job configuration: types, typestate builder, and the YAML file layer.

pub mod builder;
pub mod file;
pub mod types;

pub use builder::{CrawlConfigBuilder, compile_glob_pattern};
pub use file::{CONFIG_FILE_NAMES, FileConfig};
pub use types::{ConfigOverrides, CrawlConfig};
