use crate::bible::Bible;
use crate::models::{ChapterCoordinate, ReaderError};

/// Ordered book names for the picker's first screen.
pub fn list_books(bible: &Bible) -> Vec<&str> {
    bible.books().iter().map(|b| b.name.as_str()).collect()
}

/// 1-based chapter numbers of one book.
pub fn list_chapters(bible: &Bible, book_index: usize) -> Result<Vec<u32>, ReaderError> {
    let book = bible.book(book_index).ok_or(ReaderError::OutOfRange)?;
    Ok((1..=book.chapters.len() as u32).collect())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerView {
    BookList,
    ChapterGrid(usize),
}

/// Outcome of a selection action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerAction {
    /// Stay open (moved to the chapter grid).
    Open,
    /// Selection complete: navigate to this chapter and close.
    Navigate(ChapterCoordinate),
}

/// Book-list / chapter-grid state machine. A fresh `Picker` is built every
/// time the overlay opens, so nothing persists across closes; the owning
/// window drops it on dismiss or on `Navigate`.
#[derive(Debug)]
pub struct Picker {
    view: PickerView,
    selected_book: usize,
    selected_chapter: usize,
}

impl Picker {
    /// Open on the book list with the current book preselected.
    pub fn open(bible: &Bible, current: ChapterCoordinate) -> Self {
        Self {
            view: PickerView::BookList,
            selected_book: current.book.min(bible.len().saturating_sub(1)),
            selected_chapter: 0,
        }
    }

    pub fn view(&self) -> PickerView {
        self.view
    }

    pub fn selected_book(&self) -> usize {
        self.selected_book
    }

    pub fn selected_chapter(&self) -> usize {
        self.selected_chapter
    }

    pub fn select_next(&mut self, bible: &Bible) {
        match self.view {
            PickerView::BookList => {
                if self.selected_book + 1 < bible.len() {
                    self.selected_book += 1;
                }
            }
            PickerView::ChapterGrid(book) => {
                let chapters = bible.book(book).map_or(0, |b| b.chapters.len());
                if self.selected_chapter + 1 < chapters {
                    self.selected_chapter += 1;
                }
            }
        }
    }

    pub fn select_previous(&mut self) {
        match self.view {
            PickerView::BookList => self.selected_book = self.selected_book.saturating_sub(1),
            PickerView::ChapterGrid(_) => {
                self.selected_chapter = self.selected_chapter.saturating_sub(1)
            }
        }
    }

    /// Confirm the highlighted entry. On the book list a single-chapter book
    /// navigates directly (as the original picker does); other books open
    /// their chapter grid. On the grid the highlighted chapter navigates.
    pub fn confirm(&mut self, bible: &Bible, current: ChapterCoordinate) -> PickerAction {
        match self.view {
            PickerView::BookList => {
                let chapters = bible
                    .book(self.selected_book)
                    .map_or(0, |b| b.chapters.len());
                if chapters == 1 {
                    PickerAction::Navigate(ChapterCoordinate::new(self.selected_book, 0))
                } else {
                    self.view = PickerView::ChapterGrid(self.selected_book);
                    self.selected_chapter = if current.book == self.selected_book {
                        current.chapter
                    } else {
                        0
                    };
                    PickerAction::Open
                }
            }
            PickerView::ChapterGrid(book) => {
                PickerAction::Navigate(ChapterCoordinate::new(book, self.selected_chapter))
            }
        }
    }

    /// Back action: the chapter grid returns to the book list. On the book
    /// list this is a no-op; the owning window treats it as dismiss.
    pub fn back(&mut self) -> bool {
        match self.view {
            PickerView::ChapterGrid(_) => {
                self.view = PickerView::BookList;
                true
            }
            PickerView::BookList => false,
        }
    }
}
