use crate::config::get_app_data_prefix;
use crate::models::{ReaderError, ReadingPosition};
use rusqlite::{Connection, params};
use std::path::Path;

/// Reading positions persisted in a small sqlite database, keyed by dataset
/// identifier so several datasets can coexist. Every failure surfaces as
/// `StorageUnavailable`; callers degrade gracefully instead of crashing.
pub struct State {
    conn: Connection,
}

impl State {
    pub fn new() -> Result<Self, ReaderError> {
        let prefix = get_app_data_prefix().map_err(storage_err)?;
        std::fs::create_dir_all(&prefix).map_err(storage_err)?;
        Self::open(&prefix.join("states.db"))
    }

    pub fn open(filepath: &Path) -> Result<Self, ReaderError> {
        let conn = Connection::open(filepath).map_err(storage_err)?;

        // The schema is created only if missing, so this is safe to run on
        // an existing database.
        Self::init_db(&conn).map_err(storage_err)?;

        Ok(Self { conn })
    }

    fn init_db(conn: &Connection) -> rusqlite::Result<()> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS reading_positions (
                dataset TEXT PRIMARY KEY,
                book_index INTEGER NOT NULL,
                chapter_index INTEGER NOT NULL,
                verse INTEGER,
                timestamp INTEGER NOT NULL
            );
            ",
        )
    }

    /// Saved position for `dataset`, or `None` when nothing was written yet.
    pub fn reading_position(&self, dataset: &str) -> Result<Option<ReadingPosition>, ReaderError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT book_index, chapter_index, verse, timestamp
                 FROM reading_positions WHERE dataset=?",
            )
            .map_err(storage_err)?;
        let result = stmt.query_row(params![dataset], |row| {
            Ok(ReadingPosition {
                book_index: row.get(0)?,
                chapter_index: row.get(1)?,
                verse: row.get(2)?,
                timestamp: row.get(3)?,
            })
        });

        match result {
            Ok(position) => Ok(Some(position)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(storage_err(e)),
        }
    }

    pub fn set_reading_position(
        &self,
        dataset: &str,
        position: &ReadingPosition,
    ) -> Result<(), ReaderError> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO reading_positions
                 (dataset, book_index, chapter_index, verse, timestamp)
                 VALUES (?, ?, ?, ?, ?)",
                params![
                    dataset,
                    position.book_index,
                    position.chapter_index,
                    position.verse,
                    position.timestamp,
                ],
            )
            .map_err(storage_err)?;
        Ok(())
    }
}

fn storage_err(err: impl std::fmt::Display) -> ReaderError {
    ReaderError::StorageUnavailable(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChapterCoordinate;
    use tempfile::TempDir;

    fn setup_test_state() -> (State, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let state = State::open(&temp_dir.path().join("test_states.db")).unwrap();
        (state, temp_dir)
    }

    #[test]
    fn test_database_initialization() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("states.db");
        assert!(!db_path.exists());
        State::open(&db_path).unwrap();
        assert!(db_path.exists());
    }

    #[test]
    fn test_missing_position_is_none() {
        let (state, _temp_dir) = setup_test_state();
        assert_eq!(state.reading_position("bible.json").unwrap(), None);
    }

    #[test]
    fn test_position_round_trip_and_replace() {
        let (state, _temp_dir) = setup_test_state();

        let first = ReadingPosition::at(ChapterCoordinate::new(42, 2), Some(16), 1_000);
        state.set_reading_position("bible.json", &first).unwrap();
        assert_eq!(
            state.reading_position("bible.json").unwrap(),
            Some(first.clone())
        );

        let second = ReadingPosition::at(ChapterCoordinate::new(0, 0), None, 2_000);
        state.set_reading_position("bible.json", &second).unwrap();
        assert_eq!(state.reading_position("bible.json").unwrap(), Some(second));
    }

    #[test]
    fn test_datasets_are_isolated() {
        let (state, _temp_dir) = setup_test_state();

        let a = ReadingPosition::at(ChapterCoordinate::new(1, 1), None, 1);
        let b = ReadingPosition::at(ChapterCoordinate::new(2, 2), Some(3), 2);
        state.set_reading_position("a.json", &a).unwrap();
        state.set_reading_position("b.json", &b).unwrap();

        assert_eq!(state.reading_position("a.json").unwrap(), Some(a));
        assert_eq!(state.reading_position("b.json").unwrap(), Some(b));
    }

    #[test]
    fn test_unwritable_database_is_storage_unavailable() {
        let temp_dir = TempDir::new().unwrap();
        let result = State::open(&temp_dir.path().join("no/such/dir/states.db"));
        assert!(matches!(result, Err(ReaderError::StorageUnavailable(_))));
    }
}
