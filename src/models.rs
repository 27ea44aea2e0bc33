use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifies a chapter by its position in the canon.
///
/// Ordering is lexicographic (book, then chapter), which coincides with the
/// linear reading order of the whole Bible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChapterCoordinate {
    pub book: usize,
    pub chapter: usize,
}

impl ChapterCoordinate {
    pub fn new(book: usize, chapter: usize) -> Self {
        Self { book, chapter }
    }
}

impl std::fmt::Display for ChapterCoordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "book {} chapter {}", self.book, self.chapter)
    }
}

/// Last known reading position, persisted across sessions.
///
/// `verse` is a 1-based verse number within the chapter; `timestamp` is Unix
/// milliseconds of the last update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingPosition {
    pub book_index: usize,
    pub chapter_index: usize,
    pub verse: Option<u32>,
    pub timestamp: i64,
}

impl ReadingPosition {
    pub fn coordinate(&self) -> ChapterCoordinate {
        ChapterCoordinate::new(self.book_index, self.chapter_index)
    }

    pub fn at(coord: ChapterCoordinate, verse: Option<u32>, timestamp: i64) -> Self {
        Self {
            book_index: coord.book,
            chapter_index: coord.chapter,
            verse,
            timestamp,
        }
    }
}

/// Scroll geometry of the reading surface, in text rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScrollMetrics {
    pub scroll_top: usize,
    pub scroll_height: usize,
    pub client_height: usize,
}

impl ScrollMetrics {
    /// Normalized scroll fraction in [0.0, 1.0]; 0.0 when nothing scrolls.
    pub fn fraction(&self) -> f64 {
        let max_scroll = self.scroll_height.saturating_sub(self.client_height);
        if max_scroll == 0 {
            0.0
        } else {
            self.scroll_top as f64 / max_scroll as f64
        }
    }

    /// Content barely fills the surface, so both directions should preload.
    pub fn is_limited(&self) -> bool {
        self.scroll_height * 2 < self.client_height * 3
    }
}

#[derive(Debug, Error)]
pub enum ReaderError {
    #[error("coordinate out of range")]
    OutOfRange,
    #[error("invalid coordinate: {0}")]
    InvalidCoordinate(ChapterCoordinate),
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
}
