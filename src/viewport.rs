use crate::bible::Bible;
use crate::chapters::ChapterIndex;
use crate::logging;
use crate::models::ChapterCoordinate;
use hyphenation::{Language, Load, Standard};
use textwrap::{Options, WordSplitter};

/// One rendered chapter: the wrapped text lines plus the row offset of each
/// verse's first line. Height is `lines.len()`; geometry of the whole window
/// is derived by prefix sums, so everything here is testable headlessly and
/// the terminal layer only paints `visible_lines`.
#[derive(Debug, Clone)]
pub struct ChapterHandle {
    coord: ChapterCoordinate,
    lines: Vec<String>,
    verse_rows: Vec<usize>,
}

impl ChapterHandle {
    pub fn coordinate(&self) -> ChapterCoordinate {
        self.coord
    }

    pub fn height(&self) -> usize {
        self.lines.len()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Row offsets (within this handle) of each verse's first line.
    pub fn verse_rows(&self) -> &[usize] {
        &self.verse_rows
    }
}

/// The set of currently rendered chapters, kept in canonical reading order.
///
/// The ordered vector is both the loaded-chapter set and the document: handle
/// order always equals ascending linear position. That invariant holds after
/// every `load`, `evict_far`, and `reset`.
pub struct ViewportWindow {
    handles: Vec<ChapterHandle>,
    text_width: usize,
    splitter: WordSplitter,
}

impl ViewportWindow {
    pub fn new(text_width: usize) -> Self {
        let splitter = match Standard::from_embedded(Language::EnglishUS) {
            Ok(dictionary) => WordSplitter::Hyphenation(dictionary),
            Err(err) => {
                logging::warn(format!("hyphenation dictionary unavailable: {err}"));
                WordSplitter::NoHyphenation
            }
        };
        Self {
            handles: Vec::new(),
            text_width: text_width.max(10),
            splitter,
        }
    }

    pub fn text_width(&self) -> usize {
        self.text_width
    }

    /// Change the wrap width. Existing handles keep their old rendering;
    /// callers are expected to reset and reload after a resize.
    pub fn set_text_width(&mut self, text_width: usize) {
        self.text_width = text_width.max(10);
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn handles(&self) -> &[ChapterHandle] {
        &self.handles
    }

    pub fn coordinates(&self) -> impl Iterator<Item = ChapterCoordinate> + '_ {
        self.handles.iter().map(|h| h.coord)
    }

    pub fn contains(&self, coord: ChapterCoordinate) -> bool {
        self.index_of(coord).is_some()
    }

    fn index_of(&self, coord: ChapterCoordinate) -> Option<usize> {
        self.handles.binary_search_by(|h| h.coord.cmp(&coord)).ok()
    }

    /// Render and insert one chapter. Already-loaded chapters are a no-op and
    /// invalid coordinates are silently ignored; returns whether a new handle
    /// was inserted. Coordinate order coincides with linear-position order,
    /// so the binary search lands on the insertion point that keeps the
    /// window sorted by reading order.
    pub fn load(&mut self, bible: &Bible, coord: ChapterCoordinate) -> bool {
        let position = match self.handles.binary_search_by(|h| h.coord.cmp(&coord)) {
            Ok(_) => return false,
            Err(position) => position,
        };
        let Some(book) = bible.book(coord.book) else {
            return false;
        };
        let Some(verses) = bible.verses(coord.book, coord.chapter) else {
            return false;
        };
        let handle = self.render(coord, &book.name, verses);
        self.handles.insert(position, handle);
        true
    }

    /// Load `before` preceding and `after` following chapters around `start`,
    /// plus `start` itself, in increasing linear-position order. Ranges are
    /// clipped at the Bible boundaries.
    pub fn load_range(
        &mut self,
        bible: &Bible,
        start: ChapterCoordinate,
        before: usize,
        after: usize,
    ) {
        let index = ChapterIndex::new(bible);
        let mut coords = Vec::with_capacity(before + after + 1);
        for i in (1..=before as isize).rev() {
            if let Some(coord) = index.step(start, -i) {
                coords.push(coord);
            }
        }
        coords.push(start);
        for i in 1..=after as isize {
            if let Some(coord) = index.step(start, i) {
                coords.push(coord);
            }
        }
        for coord in coords {
            self.load(bible, coord);
        }
    }

    pub fn reset(&mut self) {
        self.handles.clear();
    }

    pub fn total_height(&self) -> usize {
        self.handles.iter().map(|h| h.height()).sum()
    }

    /// Top row of a loaded chapter within the window.
    pub fn offset_of(&self, coord: ChapterCoordinate) -> Option<usize> {
        let index = self.index_of(coord)?;
        Some(self.handles.iter().take(index).map(|h| h.height()).sum())
    }

    /// Top row of a specific verse (1-based) within the window.
    pub fn verse_offset(&self, coord: ChapterCoordinate, verse: u32) -> Option<usize> {
        let index = self.index_of(coord)?;
        let top: usize = self.handles.iter().take(index).map(|h| h.height()).sum();
        let row = *self.handles[index]
            .verse_rows
            .get(verse.checked_sub(1)? as usize)?;
        Some(top + row)
    }

    /// Evict chapters far from the viewport, farthest first, at most
    /// `max_remove` per pass and only while more than `keep_threshold`
    /// chapters are loaded. A handle intersecting the visible rows is never
    /// evicted. Returns the evicted coordinates.
    pub fn evict_far(
        &mut self,
        viewport_top: usize,
        viewport_height: usize,
        keep_threshold: usize,
        max_remove: usize,
        removal_distance: usize,
    ) -> Vec<ChapterCoordinate> {
        if self.handles.len() <= keep_threshold {
            return Vec::new();
        }
        let viewport_bottom = viewport_top + viewport_height;

        let mut candidates: Vec<(usize, usize)> = Vec::new();
        let mut top = 0usize;
        for (i, handle) in self.handles.iter().enumerate() {
            let bottom = top + handle.height();
            let distance = if bottom <= viewport_top {
                viewport_top - bottom
            } else if top >= viewport_bottom {
                top - viewport_bottom
            } else {
                top = bottom;
                continue; // intersects the viewport
            };
            if distance > removal_distance {
                candidates.push((i, distance));
            }
            top = bottom;
        }

        candidates.sort_by(|a, b| b.1.cmp(&a.1));
        candidates.truncate(max_remove);
        // Remove back to front so earlier indexes stay valid.
        candidates.sort_by(|a, b| b.0.cmp(&a.0));

        let mut evicted = Vec::with_capacity(candidates.len());
        for (i, _) in candidates {
            evicted.push(self.handles.remove(i).coord);
        }
        evicted
    }

    /// The text rows [top, top + height) across all loaded chapters.
    pub fn visible_lines(&self, top: usize, height: usize) -> Vec<&str> {
        let mut lines = Vec::with_capacity(height);
        let mut row = 0usize;
        let bottom = top + height;
        for handle in &self.handles {
            let handle_bottom = row + handle.height();
            if handle_bottom > top && row < bottom {
                let start = top.saturating_sub(row);
                let end = (bottom - row).min(handle.height());
                for line in &handle.lines[start..end] {
                    lines.push(line.as_str());
                }
            }
            row = handle_bottom;
            if row >= bottom {
                break;
            }
        }
        lines
    }

    /// First verse (document order) whose top row lies in [band_top,
    /// band_bottom), with its chapter coordinate and 1-based number.
    pub fn first_verse_in(
        &self,
        band_top: usize,
        band_bottom: usize,
    ) -> Option<(ChapterCoordinate, u32)> {
        let mut top = 0usize;
        for handle in &self.handles {
            if top >= band_bottom {
                break;
            }
            for (i, verse_row) in handle.verse_rows.iter().enumerate() {
                let row = top + verse_row;
                if row >= band_bottom {
                    break;
                }
                if row >= band_top {
                    return Some((handle.coord, i as u32 + 1));
                }
            }
            top += handle.height();
        }
        None
    }

    fn render(
        &self,
        coord: ChapterCoordinate,
        book_name: &str,
        verses: &[String],
    ) -> ChapterHandle {
        let mut lines = Vec::new();
        let mut verse_rows = Vec::with_capacity(verses.len());

        lines.push(format!("{} {}", book_name, coord.chapter + 1));
        lines.push(String::new());

        for (i, verse) in verses.iter().enumerate() {
            let prefix = format!("{:>3} ", i + 1);
            let indent = " ".repeat(prefix.len());
            let options = Options::new(self.text_width)
                .initial_indent(&prefix)
                .subsequent_indent(&indent)
                .word_splitter(self.splitter.clone());
            verse_rows.push(lines.len());
            for line in textwrap::wrap(verse, &options) {
                lines.push(line.into_owned());
            }
        }
        lines.push(String::new());

        ChapterHandle {
            coord,
            lines,
            verse_rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bible::Book;

    fn bible(chapter_counts: &[usize]) -> Bible {
        let books = chapter_counts
            .iter()
            .enumerate()
            .map(|(i, &n)| Book {
                name: format!("Book{i}"),
                chapters: (0..n)
                    .map(|c| vec![format!("verse one of chapter {c}"), "verse two".to_string()])
                    .collect(),
            })
            .collect();
        Bible::new(books)
    }

    fn loaded(window: &ViewportWindow) -> Vec<ChapterCoordinate> {
        window.coordinates().collect()
    }

    #[test]
    fn test_load_keeps_reading_order_regardless_of_load_order() {
        let bible = bible(&[3, 2]);
        let mut window = ViewportWindow::new(40);

        window.load(&bible, ChapterCoordinate::new(1, 1));
        window.load(&bible, ChapterCoordinate::new(0, 0));
        window.load(&bible, ChapterCoordinate::new(1, 0));
        window.load(&bible, ChapterCoordinate::new(0, 2));

        assert_eq!(
            loaded(&window),
            vec![
                ChapterCoordinate::new(0, 0),
                ChapterCoordinate::new(0, 2),
                ChapterCoordinate::new(1, 0),
                ChapterCoordinate::new(1, 1),
            ]
        );
    }

    #[test]
    fn test_load_is_idempotent() {
        let bible = bible(&[2]);
        let mut window = ViewportWindow::new(40);

        assert!(window.load(&bible, ChapterCoordinate::new(0, 1)));
        assert!(!window.load(&bible, ChapterCoordinate::new(0, 1)));
        assert_eq!(window.len(), 1);
    }

    #[test]
    fn test_load_invalid_is_silently_ignored() {
        let bible = bible(&[2]);
        let mut window = ViewportWindow::new(40);

        assert!(!window.load(&bible, ChapterCoordinate::new(0, 5)));
        assert!(!window.load(&bible, ChapterCoordinate::new(3, 0)));
        assert!(window.is_empty());
    }

    #[test]
    fn test_load_range_clips_at_boundaries() {
        let bible = bible(&[2, 2]);
        let mut window = ViewportWindow::new(40);

        window.load_range(&bible, ChapterCoordinate::new(0, 0), 2, 2);
        assert_eq!(
            loaded(&window),
            vec![
                ChapterCoordinate::new(0, 0),
                ChapterCoordinate::new(0, 1),
                ChapterCoordinate::new(1, 0),
            ]
        );
    }

    #[test]
    fn test_offsets_and_visible_lines() {
        let bible = bible(&[2]);
        let mut window = ViewportWindow::new(40);
        window.load_range(&bible, ChapterCoordinate::new(0, 0), 0, 1);

        let first_height = window.handles()[0].height();
        assert_eq!(window.offset_of(ChapterCoordinate::new(0, 0)), Some(0));
        assert_eq!(
            window.offset_of(ChapterCoordinate::new(0, 1)),
            Some(first_height)
        );
        assert_eq!(window.total_height(), window.visible_lines(0, 1000).len());
        assert_eq!(window.visible_lines(0, 1)[0], "Book0 1");
        assert_eq!(window.visible_lines(first_height, 1)[0], "Book0 2");
    }

    #[test]
    fn test_verse_offsets() {
        let bible = bible(&[1]);
        let mut window = ViewportWindow::new(40);
        window.load(&bible, ChapterCoordinate::new(0, 0));

        // Header and blank line precede verse 1.
        assert_eq!(window.handles()[0].verse_rows(), &[2, 3]);
        assert_eq!(window.verse_offset(ChapterCoordinate::new(0, 0), 1), Some(2));
        assert!(window.verse_offset(ChapterCoordinate::new(0, 0), 99).is_none());
        assert!(window.verse_offset(ChapterCoordinate::new(0, 0), 0).is_none());
    }

    #[test]
    fn test_evict_far_spares_the_viewport_and_respects_pass_limit() {
        let bible = bible(&[30]);
        let mut window = ViewportWindow::new(40);
        for chapter in 0..20 {
            window.load(&bible, ChapterCoordinate::new(0, chapter));
        }
        let chapter_height = window.handles()[0].height();
        let viewport_height = chapter_height; // chapter 0 fills the view

        let evicted = window.evict_far(0, viewport_height, 4, 3, viewport_height);
        assert_eq!(evicted.len(), 3);
        // Farthest first: the last chapters go before nearer ones.
        assert_eq!(
            evicted,
            vec![
                ChapterCoordinate::new(0, 19),
                ChapterCoordinate::new(0, 18),
                ChapterCoordinate::new(0, 17),
            ]
        );
        assert!(window.contains(ChapterCoordinate::new(0, 0)));
        // The survivors are still in reading order.
        let coords = loaded(&window);
        let mut sorted = coords.clone();
        sorted.sort();
        assert_eq!(coords, sorted);
    }

    #[test]
    fn test_evict_far_is_a_noop_below_threshold() {
        let bible = bible(&[10]);
        let mut window = ViewportWindow::new(40);
        for chapter in 0..5 {
            window.load(&bible, ChapterCoordinate::new(0, chapter));
        }
        assert!(window.evict_far(0, 5, 15, 3, 5).is_empty());
        assert_eq!(window.len(), 5);
    }

    #[test]
    fn test_reset_clears_everything() {
        let bible = bible(&[3]);
        let mut window = ViewportWindow::new(40);
        window.load_range(&bible, ChapterCoordinate::new(0, 1), 1, 1);
        assert_eq!(window.len(), 3);

        window.reset();
        assert!(window.is_empty());
        assert_eq!(window.total_height(), 0);
    }

    #[test]
    fn test_first_verse_in_band() {
        let bible = bible(&[2]);
        let mut window = ViewportWindow::new(40);
        window.load_range(&bible, ChapterCoordinate::new(0, 0), 0, 1);

        // Band covering the top of the first chapter finds its first verse.
        assert_eq!(
            window.first_verse_in(0, 5),
            Some((ChapterCoordinate::new(0, 0), 1))
        );

        // A band past every verse row finds nothing.
        let total = window.total_height();
        assert_eq!(window.first_verse_in(total, total + 10), None);

        // A band starting inside chapter 2 finds a chapter 2 verse.
        let second_top = window.offset_of(ChapterCoordinate::new(0, 1)).unwrap();
        let (coord, _verse) = window.first_verse_in(second_top, total).unwrap();
        assert_eq!(coord, ChapterCoordinate::new(0, 1));
    }
}
