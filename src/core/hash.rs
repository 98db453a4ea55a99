//! Content digests for exact-duplicate detection

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::config::HASH_BUFFER_SIZE;

/// Lowercase hex BLAKE3 digest of a file's full contents
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentDigest(String);

impl ContentDigest {
	/// Stream the file in fixed-size chunks so memory use does not grow with file size
	pub fn compute(path: &Path) -> std::io::Result<Self> {
		let mut file = File::open(path)?;
		Self::from_reader(&mut file)
	}

	pub fn from_reader<R: Read>(reader: &mut R) -> std::io::Result<Self> {
		let mut hasher = blake3::Hasher::new();
		let mut buffer = [0u8; HASH_BUFFER_SIZE];

		loop {
			let n = reader.read(&mut buffer)?;
			if n == 0 {
				break;
			}
			hasher.update(&buffer[..n]);
		}

		Ok(Self(hasher.finalize().to_hex().to_string()))
	}

	/// Wrap a digest read back from the registry
	pub fn from_hex(hex: impl Into<String>) -> Self {
		Self(hex.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}

	pub fn short(&self) -> &str {
		&self.0[..self.0.len().min(8)]
	}
}

impl std::fmt::Display for ContentDigest {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.0)
	}
}
