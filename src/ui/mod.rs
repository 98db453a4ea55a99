//! # User Interface
//!
//! Glyph-prefixed status lines; errors go to stderr, debug lines only with `-v`.

pub mod log;

pub use log::{debug, error, header, info, path_link, success, warn, Log};
