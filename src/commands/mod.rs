//! # Command Implementations
//!
//! Each submodule handles one CLI command.

pub mod accept;
pub mod check;
pub mod commit;
pub mod library;
pub mod report;
