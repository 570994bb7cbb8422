//! On-disk layout: strategy analysis, path mapping, and persistence.

pub mod path_mapper;
pub mod saver;
pub mod strategy;

pub use path_mapper::{save_path, save_rel_path, strategy_path};
pub use saver::{ensure_host_gitignore, save_content};
pub use strategy::{SaveStrategy, analyze};
