//! # Sift Library
//!
//! Duplicate and near-duplicate detection for curated image libraries.
//! Candidates are matched by content digest first, then by CNN embedding
//! similarity, and accepted images are committed into the library.

pub mod cli;
pub mod commands;
pub mod config;
pub mod core;
pub mod error;
pub mod library;
pub mod models;
pub mod pipeline;
pub mod processing;
pub mod runtime;
pub mod storage;
pub mod ui;

pub use crate::core::{Candidate, DetectionResultSet, Status};
pub use config::DetectionConfig;
pub use library::Library;
pub use pipeline::{commit_normal, override_to_normal, Detector};
