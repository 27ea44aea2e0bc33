use crate::bible::Bible;
use crate::models::{ChapterCoordinate, ReaderError};

/// Pure coordinate math over an immutable dataset.
///
/// Linear positions are a total order over all chapters: the sum of the
/// chapter counts of all preceding books plus the chapter index within the
/// current book. Given a fixed dataset they are bijective with valid
/// coordinates.
pub struct ChapterIndex<'a> {
    bible: &'a Bible,
}

impl<'a> ChapterIndex<'a> {
    pub fn new(bible: &'a Bible) -> Self {
        Self { bible }
    }

    pub fn is_valid(&self, coord: ChapterCoordinate) -> bool {
        match self.bible.book(coord.book) {
            Some(book) => coord.chapter < book.chapters.len(),
            None => false,
        }
    }

    pub fn linear_position(&self, coord: ChapterCoordinate) -> Result<usize, ReaderError> {
        if !self.is_valid(coord) {
            return Err(ReaderError::OutOfRange);
        }
        let preceding: usize = self
            .bible
            .books()
            .iter()
            .take(coord.book)
            .map(|b| b.chapters.len())
            .sum();
        Ok(preceding + coord.chapter)
    }

    /// The chapter immediately before `coord`, crossing book boundaries;
    /// `None` at the start of the Bible or for an invalid coordinate.
    pub fn previous(&self, coord: ChapterCoordinate) -> Option<ChapterCoordinate> {
        if !self.is_valid(coord) {
            return None;
        }
        if coord.chapter > 0 {
            Some(ChapterCoordinate::new(coord.book, coord.chapter - 1))
        } else if coord.book > 0 {
            let prev_book = self.bible.book(coord.book - 1)?;
            Some(ChapterCoordinate::new(
                coord.book - 1,
                prev_book.chapters.len() - 1,
            ))
        } else {
            None
        }
    }

    /// The chapter immediately after `coord`, crossing book boundaries;
    /// `None` at the end of the Bible or for an invalid coordinate.
    pub fn next(&self, coord: ChapterCoordinate) -> Option<ChapterCoordinate> {
        if !self.is_valid(coord) {
            return None;
        }
        let book = self.bible.book(coord.book)?;
        if coord.chapter + 1 < book.chapters.len() {
            Some(ChapterCoordinate::new(coord.book, coord.chapter + 1))
        } else if coord.book + 1 < self.bible.len() {
            Some(ChapterCoordinate::new(coord.book + 1, 0))
        } else {
            None
        }
    }

    /// Apply `previous`/`next` |n| times (direction by sign). Stops with
    /// `None` as soon as a boundary is hit; there is no wraparound and no
    /// partial-step result.
    pub fn step(&self, coord: ChapterCoordinate, n: isize) -> Option<ChapterCoordinate> {
        let mut current = coord;
        for _ in 0..n.unsigned_abs() {
            current = if n < 0 {
                self.previous(current)?
            } else {
                self.next(current)?
            };
        }
        if self.is_valid(current) { Some(current) } else { None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bible::Book;

    /// Genesis with 2 chapters, Exodus with 2 chapters.
    fn two_book_bible() -> Bible {
        Bible::new(vec![
            Book {
                name: "Genesis".to_string(),
                chapters: vec![
                    vec!["v1".to_string(), "v2".to_string()],
                    vec!["v1".to_string()],
                ],
            },
            Book {
                name: "Exodus".to_string(),
                chapters: vec![vec!["v1".to_string()], vec!["v1".to_string()]],
            },
        ])
    }

    #[test]
    fn test_linear_positions() {
        let bible = two_book_bible();
        let index = ChapterIndex::new(&bible);

        assert_eq!(
            index.linear_position(ChapterCoordinate::new(0, 0)).unwrap(),
            0
        );
        assert_eq!(
            index.linear_position(ChapterCoordinate::new(0, 1)).unwrap(),
            1
        );
        assert_eq!(
            index.linear_position(ChapterCoordinate::new(1, 0)).unwrap(),
            2
        );
        assert_eq!(
            index.linear_position(ChapterCoordinate::new(1, 1)).unwrap(),
            3
        );
    }

    #[test]
    fn test_linear_position_out_of_range() {
        let bible = two_book_bible();
        let index = ChapterIndex::new(&bible);

        assert!(matches!(
            index.linear_position(ChapterCoordinate::new(0, 2)),
            Err(ReaderError::OutOfRange)
        ));
        assert!(matches!(
            index.linear_position(ChapterCoordinate::new(2, 0)),
            Err(ReaderError::OutOfRange)
        ));
    }

    #[test]
    fn test_previous_next_round_trip() {
        let bible = two_book_bible();
        let index = ChapterIndex::new(&bible);

        for book in 0..2 {
            for chapter in 0..2 {
                let coord = ChapterCoordinate::new(book, chapter);
                if let Some(next) = index.next(coord) {
                    assert_eq!(index.previous(next), Some(coord));
                }
                if let Some(prev) = index.previous(coord) {
                    assert_eq!(index.next(prev), Some(coord));
                }
            }
        }
    }

    #[test]
    fn test_boundaries() {
        let bible = two_book_bible();
        let index = ChapterIndex::new(&bible);

        assert_eq!(index.previous(ChapterCoordinate::new(0, 0)), None);
        assert_eq!(index.next(ChapterCoordinate::new(1, 1)), None);
    }

    #[test]
    fn test_crossing_book_boundary() {
        let bible = two_book_bible();
        let index = ChapterIndex::new(&bible);

        assert_eq!(
            index.next(ChapterCoordinate::new(0, 1)),
            Some(ChapterCoordinate::new(1, 0))
        );
        assert_eq!(
            index.previous(ChapterCoordinate::new(1, 0)),
            Some(ChapterCoordinate::new(0, 1))
        );
    }

    #[test]
    fn test_step() {
        let bible = two_book_bible();
        let index = ChapterIndex::new(&bible);
        let start = ChapterCoordinate::new(0, 0);

        assert_eq!(index.step(start, 0), Some(start));
        assert_eq!(index.step(start, 1), Some(ChapterCoordinate::new(0, 1)));
        assert_eq!(index.step(start, 3), Some(ChapterCoordinate::new(1, 1)));
        assert_eq!(index.step(start, -1), None);
        assert_eq!(index.step(start, 4), None);
        assert_eq!(
            index.step(ChapterCoordinate::new(1, 1), -3),
            Some(ChapterCoordinate::new(0, 0))
        );
    }

    #[test]
    fn test_invalid_coordinate_is_a_dead_end() {
        let bible = two_book_bible();
        let index = ChapterIndex::new(&bible);
        let bogus = ChapterCoordinate::new(9, 9);

        assert!(!index.is_valid(bogus));
        assert_eq!(index.previous(bogus), None);
        assert_eq!(index.next(bogus), None);
        assert_eq!(index.step(bogus, 1), None);
    }
}
