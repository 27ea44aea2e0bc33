use crate::models::{ChapterCoordinate, ReadingPosition, ScrollMetrics};
use crate::viewport::ViewportWindow;

/// A single-shot timer driven by an externally supplied clock (milliseconds).
/// Rescheduling replaces the deadline; deferred work never stacks. Tests
/// advance time manually instead of sleeping.
#[derive(Debug, Default)]
pub struct DebounceTimer {
    deadline: Option<u64>,
}

impl DebounceTimer {
    pub fn schedule(&mut self, now_ms: u64, window_ms: u64) {
        self.deadline = Some(now_ms + window_ms);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_scheduled(&self) -> bool {
        self.deadline.is_some()
    }

    /// True exactly once when the deadline has passed.
    pub fn fire_due(&mut self, now_ms: u64) -> bool {
        match self.deadline {
            Some(deadline) if now_ms >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

/// Which direction(s) the window should grow in after a scroll event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadDirective {
    pub toward_start: bool,
    pub toward_end: bool,
}

/// Converts scroll state into load directives and current-position
/// bookkeeping, and coalesces position writes through a debounce window.
///
/// Everything here is synchronous; the caller throttles scroll handling (one
/// invocation per ~32ms) and pumps `take_due_write` from its event loop.
pub struct ScrollTracker {
    current: ChapterCoordinate,
    current_verse: Option<u32>,
    pending: Option<ReadingPosition>,
    timer: DebounceTimer,
    low_watermark: f64,
    high_watermark: f64,
    debounce_ms: u64,
}

impl ScrollTracker {
    pub fn new(start: ChapterCoordinate, low: f64, high: f64, debounce_ms: u64) -> Self {
        Self {
            current: start,
            current_verse: None,
            pending: None,
            timer: DebounceTimer::default(),
            low_watermark: low,
            high_watermark: high,
            debounce_ms,
        }
    }

    pub fn current(&self) -> ChapterCoordinate {
        self.current
    }

    pub fn current_verse(&self) -> Option<u32> {
        self.current_verse
    }

    /// Watermark check. Below the low watermark requests growth toward the
    /// start, above the high watermark toward the end; content that barely
    /// fills the surface requests both.
    pub fn on_scroll(&self, metrics: ScrollMetrics) -> LoadDirective {
        let fraction = metrics.fraction();
        let limited = metrics.is_limited();
        LoadDirective {
            toward_start: limited || fraction < self.low_watermark,
            toward_end: limited || fraction > self.high_watermark,
        }
    }

    /// Re-derive the current chapter/verse from the reading band: the first
    /// verse whose top row sits below the header offset and above 30% of the
    /// viewport height. When no verse is in the band the previous value is
    /// retained. A change schedules (or reschedules) the debounced write.
    pub fn observe(
        &mut self,
        window: &ViewportWindow,
        metrics: ScrollMetrics,
        header_offset: usize,
        now_ms: u64,
    ) {
        let band_top = metrics.scroll_top + header_offset;
        let band_bottom =
            metrics.scroll_top + (metrics.client_height * 3 / 10).max(header_offset + 1);
        let Some((coord, verse)) = window.first_verse_in(band_top, band_bottom) else {
            return;
        };

        if coord != self.current || Some(verse) != self.current_verse {
            self.current = coord;
            self.current_verse = Some(verse);
            self.pending = Some(ReadingPosition::at(coord, Some(verse), now_ms as i64));
            self.timer.schedule(now_ms, self.debounce_ms);
        }
    }

    /// Hard repositioning (navigation jump or dataset swap). Cancels any
    /// pending debounced write; the caller persists immediately instead.
    pub fn reposition(&mut self, coord: ChapterCoordinate) {
        self.current = coord;
        self.current_verse = None;
        self.pending = None;
        self.timer.cancel();
    }

    /// The coalesced write once the debounce window has elapsed, else `None`.
    pub fn take_due_write(&mut self, now_ms: u64) -> Option<ReadingPosition> {
        if self.timer.fire_due(now_ms) {
            self.pending.take()
        } else {
            None
        }
    }

    pub fn has_pending_write(&self) -> bool {
        self.pending.is_some() && self.timer.is_scheduled()
    }
}
