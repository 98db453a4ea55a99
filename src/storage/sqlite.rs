//! SQLite-backed registry

use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

use super::Registry;
use crate::core::{ContentDigest, LibraryId, LibraryRecord, NewLibraryRecord};
use crate::error::RegistryError;

/// Forward-only schema migrations
const MIGRATIONS: &[&str] = &[
	r#"
	CREATE TABLE image_library (
		id INTEGER PRIMARY KEY AUTOINCREMENT,
		image_name TEXT NOT NULL,
		image_path TEXT NOT NULL UNIQUE,
		content_digest TEXT NOT NULL,
		width INTEGER NOT NULL,
		height INTEGER NOT NULL,
		created_at TEXT NOT NULL
	);

	CREATE INDEX idx_image_library_digest ON image_library(content_digest);
	"#,
];

const SELECT_COLUMNS: &str = "SELECT id, image_name, image_path, content_digest, width, height FROM image_library";

pub struct SqliteRegistry {
	conn: Connection,
}

impl SqliteRegistry {
	pub fn open(db_path: &Path) -> Result<Self, RegistryError> {
		let conn = Connection::open(db_path)?;
		conn.execute_batch("PRAGMA journal_mode = WAL;")?;
		Self::from_connection(conn)
	}

	pub fn in_memory() -> Result<Self, RegistryError> {
		Self::from_connection(Connection::open_in_memory()?)
	}

	fn from_connection(conn: Connection) -> Result<Self, RegistryError> {
		run_migrations(&conn)?;
		Ok(Self { conn })
	}

	pub fn count(&self) -> Result<usize, RegistryError> {
		let n: i64 = self.conn.query_row("SELECT COUNT(*) FROM image_library", [], |row| row.get(0))?;
		Ok(n as usize)
	}
}

fn run_migrations(conn: &Connection) -> Result<(), RegistryError> {
	let current: u32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
	let target = MIGRATIONS.len() as u32;

	if current > target {
		return Err(RegistryError::Other(format!(
			"Registry schema version {} is newer than this build supports (max {})",
			current, target
		)));
	}

	for (i, migration) in MIGRATIONS.iter().enumerate() {
		let version = (i + 1) as u32;
		if version <= current {
			continue;
		}
		conn.execute_batch(migration)?;
		conn.execute_batch(&format!("PRAGMA user_version = {}", version))?;
		crate::ui::debug(&format!("Applied registry migration {}", version));
	}

	Ok(())
}

fn map_record(row: &Row) -> rusqlite::Result<LibraryRecord> {
	Ok(LibraryRecord {
		id: row.get(0)?,
		display_name: row.get(1)?,
		storage_path: row.get(2)?,
		content_digest: ContentDigest::from_hex(row.get::<_, String>(3)?),
		width: row.get(4)?,
		height: row.get(5)?,
	})
}

fn insert(conn: &Connection, record: &NewLibraryRecord, created_at: &str) -> rusqlite::Result<LibraryId> {
	conn.execute(
		"INSERT INTO image_library (image_name, image_path, content_digest, width, height, created_at)
		 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
		params![
			record.display_name,
			record.storage_path,
			record.content_digest.as_str(),
			record.width,
			record.height,
			created_at,
		],
	)?;
	Ok(conn.last_insert_rowid())
}

impl Registry for SqliteRegistry {
	fn lookup_by_digest(&self, digest: &ContentDigest) -> Result<Option<LibraryRecord>, RegistryError> {
		let sql = format!("{} WHERE content_digest = ?1 ORDER BY id LIMIT 1", SELECT_COLUMNS);
		let record = self
			.conn
			.query_row(&sql, params![digest.as_str()], map_record)
			.optional()?;
		Ok(record)
	}

	fn records(&self) -> Result<Vec<LibraryRecord>, RegistryError> {
		let sql = format!("{} ORDER BY id", SELECT_COLUMNS);
		let mut stmt = self.conn.prepare(&sql)?;
		let rows = stmt.query_map([], map_record)?;
		Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
	}

	fn insert_batch(&mut self, records: &[NewLibraryRecord]) -> Result<Vec<LibraryId>, RegistryError> {
		let created_at = chrono::Utc::now().to_rfc3339();
		let tx = self.conn.transaction()?;

		let mut ids = Vec::with_capacity(records.len());
		for record in records {
			ids.push(insert(&tx, record, &created_at)?);
		}

		// Dropping an uncommitted transaction rolls it back
		tx.commit()?;
		Ok(ids)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn record(name: &str, digest: char) -> NewLibraryRecord {
		NewLibraryRecord {
			display_name: name.to_string(),
			storage_path: format!("/lib/{}", name),
			content_digest: ContentDigest::from_hex(digest.to_string().repeat(64)),
			width: 640,
			height: 480,
		}
	}

	#[test]
	fn lookup_returns_first_match() {
		let mut registry = SqliteRegistry::in_memory().unwrap();
		let ids = registry
			.insert_batch(&[record("a.png", 'a'), record("b.png", 'b'), record("c.png", 'a')])
			.unwrap();

		let found = registry
			.lookup_by_digest(&ContentDigest::from_hex("a".repeat(64)))
			.unwrap()
			.unwrap();
		assert_eq!(found.id, ids[0]);
		assert_eq!(found.display_name, "a.png");
		assert_eq!((found.width, found.height), (640, 480));

		let missing = registry.lookup_by_digest(&ContentDigest::from_hex("f".repeat(64))).unwrap();
		assert!(missing.is_none());
	}

	#[test]
	fn records_are_in_insert_order() {
		let mut registry = SqliteRegistry::in_memory().unwrap();
		registry.insert_batch(&[record("z.png", '1'), record("a.png", '2')]).unwrap();
		let names: Vec<String> = registry.records().unwrap().into_iter().map(|r| r.display_name).collect();
		assert_eq!(names, vec!["z.png", "a.png"]);
	}

	#[test]
	fn failed_batch_rolls_back_everything() {
		let mut registry = SqliteRegistry::in_memory().unwrap();
		registry.insert_batch(&[record("taken.png", '1')]).unwrap();

		// Second entry violates the unique storage path
		let result = registry.insert_batch(&[record("new.png", '2'), record("taken.png", '3')]);
		assert!(result.is_err());
		assert_eq!(registry.count().unwrap(), 1);
	}

	#[test]
	fn reopening_keeps_schema_and_rows() {
		let dir = tempfile::TempDir::new().unwrap();
		let db = dir.path().join("library.db");
		{
			let mut registry = SqliteRegistry::open(&db).unwrap();
			registry.insert_batch(&[record("a.png", 'a')]).unwrap();
		}
		let registry = SqliteRegistry::open(&db).unwrap();
		assert_eq!(registry.count().unwrap(), 1);
	}
}
