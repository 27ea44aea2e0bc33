use crate::bible::Bible;
use crate::chapters::ChapterIndex;
use crate::logging;
use crate::models::{ChapterCoordinate, ReaderError, ReadingPosition, ScrollMetrics};
use crate::settings::ScrollTunables;
use crate::tracker::ScrollTracker;
use crate::viewport::ViewportWindow;

/// Rows between the top of the viewport and the start of the reading band.
const READING_BAND_OFFSET: usize = 1;

/// One independent reading session: the dataset, the loaded-chapter window,
/// the scroll tracker, and the scroll geometry, with no shared globals.
/// Everything runs synchronously on the caller's thread; the only deferred
/// work is the tracker's debounce timer, pumped via [`take_due_write`].
///
/// [`take_due_write`]: ReaderSession::take_due_write
pub struct ReaderSession {
    bible: Bible,
    window: ViewportWindow,
    tracker: ScrollTracker,
    tunables: ScrollTunables,
    scroll_top: usize,
    client_height: usize,
}

impl ReaderSession {
    pub fn new(
        bible: Bible,
        tunables: ScrollTunables,
        text_width: usize,
        client_height: usize,
    ) -> Self {
        let tracker = ScrollTracker::new(
            ChapterCoordinate::new(0, 0),
            tunables.low_watermark,
            tunables.high_watermark,
            tunables.persist_debounce_ms,
        );
        Self {
            bible,
            window: ViewportWindow::new(text_width),
            tracker,
            tunables,
            scroll_top: 0,
            client_height: client_height.max(1),
        }
    }

    pub fn bible(&self) -> &Bible {
        &self.bible
    }

    pub fn window(&self) -> &ViewportWindow {
        &self.window
    }

    pub fn current(&self) -> ChapterCoordinate {
        self.tracker.current()
    }

    pub fn current_verse(&self) -> Option<u32> {
        self.tracker.current_verse()
    }

    /// "Genesis 3" for the top bar.
    pub fn current_label(&self) -> String {
        let coord = self.tracker.current();
        match self.bible.book(coord.book) {
            Some(book) => format!("{} {}", book.name, coord.chapter + 1),
            None => String::new(),
        }
    }

    pub fn metrics(&self) -> ScrollMetrics {
        ScrollMetrics {
            scroll_top: self.scroll_top,
            scroll_height: self.window.total_height(),
            client_height: self.client_height,
        }
    }

    pub fn visible_lines(&self) -> Vec<&str> {
        self.window.visible_lines(self.scroll_top, self.client_height)
    }

    /// Initial load. A saved position is honored when it is still valid for
    /// this dataset; otherwise reading starts at the first chapter.
    pub fn restore(&mut self, saved: Option<ReadingPosition>) {
        let index = ChapterIndex::new(&self.bible);
        let mut start = ChapterCoordinate::new(0, 0);
        let mut verse = None;
        if let Some(saved) = saved {
            if index.is_valid(saved.coordinate()) {
                start = saved.coordinate();
                verse = saved.verse;
            } else {
                logging::warn(format!("saved position no longer valid: {}", saved.coordinate()));
            }
        }

        self.window.reset();
        self.tracker.reposition(start);
        self.window.load_range(
            &self.bible,
            start,
            self.tunables.scroll_preload,
            self.tunables.scroll_preload,
        );
        self.scroll_top = verse
            .and_then(|v| self.window.verse_offset(start, v))
            .or_else(|| self.window.offset_of(start))
            .unwrap_or(0);
        self.clamp_scroll();
    }

    /// Explicit navigation jump. An invalid coordinate is an error and
    /// changes nothing; otherwise the window is rebuilt around the target
    /// (which synchronously supersedes any pending scroll-driven work), the
    /// viewport is aligned to the target's top, and the position to persist
    /// immediately is returned.
    pub fn go_to(
        &mut self,
        coord: ChapterCoordinate,
        now_ms: u64,
    ) -> Result<ReadingPosition, ReaderError> {
        if !ChapterIndex::new(&self.bible).is_valid(coord) {
            return Err(ReaderError::InvalidCoordinate(coord));
        }

        self.window.reset();
        self.tracker.reposition(coord);
        self.window.load_range(
            &self.bible,
            coord,
            self.tunables.jump_preload_before,
            self.tunables.jump_preload_after,
        );
        self.scroll_top = self.window.offset_of(coord).unwrap_or(0);
        self.clamp_scroll();

        Ok(ReadingPosition::at(coord, None, now_ms as i64))
    }

    /// Swap the bootstrap subset for the full dataset. The current position
    /// is re-anchored by book name, since book indexes differ between the
    /// subset and the full canon; an unknown name clamps instead.
    pub fn swap_dataset(&mut self, full: Bible) {
        let old = self.tracker.current();
        let book = self
            .bible
            .book(old.book)
            .and_then(|b| full.position_of_book(&b.name))
            .unwrap_or_else(|| old.book.min(full.len().saturating_sub(1)));
        let chapter = match full.book(book) {
            Some(b) if !b.chapters.is_empty() => old.chapter.min(b.chapters.len() - 1),
            _ => 0,
        };
        let coord = ChapterCoordinate::new(book, chapter);

        self.bible = full;
        self.window.reset();
        self.tracker.reposition(coord);
        self.window.load_range(
            &self.bible,
            coord,
            self.tunables.scroll_preload,
            self.tunables.scroll_preload,
        );
        self.scroll_top = self.window.offset_of(coord).unwrap_or(0);
        self.clamp_scroll();
    }

    /// Scroll by `delta` rows and run the load/evict/track pipeline.
    pub fn scroll_by(&mut self, delta: isize, now_ms: u64) {
        self.scroll_top = if delta < 0 {
            self.scroll_top.saturating_sub(delta.unsigned_abs())
        } else {
            self.scroll_top + delta as usize
        };
        self.clamp_scroll();
        self.handle_scroll(now_ms);
    }

    pub fn page_by(&mut self, pages: isize, now_ms: u64) {
        self.scroll_by(pages * self.client_height.saturating_sub(1) as isize, now_ms);
    }

    /// Seamless jump to the adjacent chapter without rebuilding the window.
    pub fn next_chapter(&mut self, now_ms: u64) {
        if let Some(coord) = ChapterIndex::new(&self.bible).next(self.tracker.current()) {
            self.scroll_to_chapter(coord, now_ms);
        }
    }

    pub fn previous_chapter(&mut self, now_ms: u64) {
        if let Some(coord) = ChapterIndex::new(&self.bible).previous(self.tracker.current()) {
            self.scroll_to_chapter(coord, now_ms);
        }
    }

    fn scroll_to_chapter(&mut self, coord: ChapterCoordinate, now_ms: u64) {
        self.window.load_range(&self.bible, coord, 1, 1);
        if let Some(offset) = self.window.offset_of(coord) {
            self.scroll_top = offset;
        }
        self.clamp_scroll();
        self.handle_scroll(now_ms);
    }

    /// Terminal resize. Width changes invalidate the wrapped rendering, so
    /// the window is rebuilt around the current chapter.
    pub fn resize(&mut self, text_width: usize, client_height: usize) {
        self.client_height = client_height.max(1);
        if text_width.max(10) != self.window.text_width() {
            let current = self.tracker.current();
            self.window.reset();
            self.window.set_text_width(text_width);
            self.window.load_range(
                &self.bible,
                current,
                self.tunables.scroll_preload,
                self.tunables.scroll_preload,
            );
            self.scroll_top = self.window.offset_of(current).unwrap_or(0);
        }
        self.clamp_scroll();
    }

    /// The debounced reading-position write once due, else `None`. Callers
    /// pump this from their event loop and hand the result to storage.
    pub fn take_due_write(&mut self, now_ms: u64) -> Option<ReadingPosition> {
        self.tracker.take_due_write(now_ms)
    }

    /// The scroll pipeline: watermark-driven loads, eviction, current
    /// position re-derivation. Loads and evictions above the viewport would
    /// shift every following row, so the mutation is bracketed by an anchor
    /// on the current chapter and the scroll offset is corrected afterwards.
    fn handle_scroll(&mut self, now_ms: u64) {
        let directive = self.tracker.on_scroll(self.metrics());

        let anchor = self.tracker.current();
        let anchor_before = self.window.offset_of(anchor);

        if directive.toward_start {
            let first = self.window.coordinates().next();
            if let Some(first) = first {
                self.window
                    .load_range(&self.bible, first, self.tunables.scroll_preload, 0);
            }
        }
        if directive.toward_end {
            let last = self.window.coordinates().last();
            if let Some(last) = last {
                self.window
                    .load_range(&self.bible, last, 0, self.tunables.scroll_preload);
            }
        }

        let evicted = self.window.evict_far(
            self.scroll_top,
            self.client_height,
            self.tunables.keep_threshold,
            self.tunables.max_remove_per_pass,
            self.client_height * self.tunables.removal_viewports,
        );
        if !evicted.is_empty() {
            logging::debug(format!("evicted {} chapters", evicted.len()));
        }

        if let (Some(before), Some(after)) = (anchor_before, self.window.offset_of(anchor)) {
            if after >= before {
                self.scroll_top += after - before;
            } else {
                self.scroll_top = self.scroll_top.saturating_sub(before - after);
            }
        }
        self.clamp_scroll();

        self.tracker
            .observe(&self.window, self.metrics(), READING_BAND_OFFSET, now_ms);
    }

    fn clamp_scroll(&mut self) {
        let max = self
            .window
            .total_height()
            .saturating_sub(self.client_height);
        self.scroll_top = self.scroll_top.min(max);
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
                    .map(|_| vec!["a verse".to_string(), "another verse".to_string()])
                    .collect(),
            })
            .collect();
        Bible::new(books)
    }

    fn session(chapter_counts: &[usize]) -> ReaderSession {
        let mut session = ReaderSession::new(
            bible(chapter_counts),
            ScrollTunables::default(),
            40,
            10,
        );
        session.restore(None);
        session
    }

    #[test]
    fn test_restore_defaults_to_first_chapter() {
        let session = session(&[5]);
        assert_eq!(session.current(), ChapterCoordinate::new(0, 0));
        assert!(session.window().contains(ChapterCoordinate::new(0, 0)));
        assert_eq!(session.metrics().scroll_top, 0);
    }

    #[test]
    fn test_restore_ignores_stale_position() {
        let mut session = ReaderSession::new(bible(&[2]), ScrollTunables::default(), 40, 10);
        session.restore(Some(ReadingPosition::at(
            ChapterCoordinate::new(60, 0),
            None,
            0,
        )));
        assert_eq!(session.current(), ChapterCoordinate::new(0, 0));
    }

    #[test]
    fn test_restore_scrolls_to_saved_verse() {
        let mut session = ReaderSession::new(bible(&[3]), ScrollTunables::default(), 40, 10);
        session.restore(Some(ReadingPosition::at(
            ChapterCoordinate::new(0, 2),
            Some(2),
            0,
        )));
        let expected = session
            .window()
            .verse_offset(ChapterCoordinate::new(0, 2), 2)
            .unwrap();
        // Clamped to the maximum scroll offset when the tail is short.
        let max = session.window().total_height() - 10;
        assert_eq!(session.metrics().scroll_top, expected.min(max));
    }

    #[test]
    fn test_go_to_invalid_changes_nothing() {
        let mut session = session(&[2, 2]);
        let before: Vec<_> = session.window().coordinates().collect();
        let current = session.current();

        let result = session.go_to(ChapterCoordinate::new(9, 0), 0);
        assert!(matches!(result, Err(ReaderError::InvalidCoordinate(_))));
        assert_eq!(session.window().coordinates().collect::<Vec<_>>(), before);
        assert_eq!(session.current(), current);
    }

    #[test]
    fn test_scrolling_grows_the_window_toward_the_end() {
        let mut session = session(&[20]);
        let before = session.window().len();
        // Drive to the bottom watermark repeatedly.
        for i in 0..20 {
            let max = session.metrics().scroll_height;
            session.scroll_by(max as isize, i * 40);
        }
        assert!(session.window().len() > before);
        // Ordering invariant survives the whole run.
        let coords: Vec<_> = session.window().coordinates().collect();
        let mut sorted = coords.clone();
        sorted.sort();
        assert_eq!(coords, sorted);
    }

    #[test]
    fn test_anchor_keeps_current_chapter_steady_when_loading_above() {
        let mut session = ReaderSession::new(bible(&[30]), ScrollTunables::default(), 40, 10);
        session.restore(Some(ReadingPosition::at(
            ChapterCoordinate::new(0, 20),
            None,
            0,
        )));
        let current = session.current();
        let offset_in_view = session.window().offset_of(current).unwrap() as isize
            - session.metrics().scroll_top as isize;

        // Past the top watermark: chapters load above the viewport.
        session.scroll_by(-8, 100);
        let after = session.window().offset_of(current).unwrap() as isize
            - session.metrics().scroll_top as isize;
        // The chapter moved only by the 8 rows scrolled, not by the rows
        // inserted above it.
        assert_eq!(after, offset_in_view + 8);
    }

    #[test]
    fn test_swap_dataset_reanchors_by_name() {
        let bootstrap = Bible::new(vec![Book {
            name: "John".to_string(),
            chapters: (0..3)
                .map(|_| vec!["word".to_string()])
                .collect(),
        }]);
        let mut session =
            ReaderSession::new(bootstrap, ScrollTunables::default(), 40, 10);
        session.restore(None);
        session
            .go_to(ChapterCoordinate::new(0, 2), 0)
            .unwrap();

        let full = Bible::new(
            ["Matthew", "Mark", "Luke", "John"]
                .iter()
                .map(|name| Book {
                    name: name.to_string(),
                    chapters: (0..5).map(|_| vec!["word".to_string()]).collect(),
                })
                .collect(),
        );
        session.swap_dataset(full);

        assert_eq!(session.current(), ChapterCoordinate::new(3, 2));
        assert_eq!(session.current_label(), "John 3");
        assert!(session.window().contains(ChapterCoordinate::new(3, 2)));
    }

    #[test]
    fn test_swap_dataset_clamps_unknown_book() {
        let bootstrap = Bible::new(vec![Book {
            name: "Deuterocanon".to_string(),
            chapters: vec![vec!["word".to_string()]],
        }]);
        let mut session =
            ReaderSession::new(bootstrap, ScrollTunables::default(), 40, 10);
        session.restore(None);

        let full = bible(&[2, 2]);
        session.swap_dataset(full);
        assert_eq!(session.current(), ChapterCoordinate::new(0, 0));
    }

    #[test]
    fn test_resize_rebuilds_at_new_width() {
        let mut session = session(&[5]);
        session.go_to(ChapterCoordinate::new(0, 3), 0).unwrap();

        session.resize(20, 8);
        assert_eq!(session.window().text_width(), 20);
        assert_eq!(session.current(), ChapterCoordinate::new(0, 3));
        assert!(session.window().contains(ChapterCoordinate::new(0, 3)));
    }
}
