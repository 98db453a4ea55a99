//! Detection pipeline stages

pub mod archive;
pub mod classify;
pub mod commit;
pub mod image;
pub mod scan;
pub mod similarity;

pub use archive::{extract, ExtractReport};
pub use classify::{ClassifyOptions, Classifier};
pub use commit::{commit_normal, CommitReport};
pub use scan::{ScanResult, Scanner};
pub use similarity::{best_match, LibrarySnapshot};
