pub mod constants;
pub mod url_utils;

pub use constants::*;
pub use url_utils::{is_fetchable_url, normalize_url, resolve_protocol_relative};
