use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph},
};

use super::centered_popup_area;
use crate::bible::Bible;
use crate::models::ChapterCoordinate;
use crate::picker::{Picker, PickerView, list_books, list_chapters};

/// Chapter numbers laid out per grid row.
const GRID_COLUMNS: usize = 10;

pub struct PickerWindow {
    pub visible: bool,
    pub picker: Option<Picker>,
}

impl PickerWindow {
    pub fn new() -> Self {
        Self {
            visible: false,
            picker: None,
        }
    }

    pub fn open(&mut self, bible: &Bible, current: ChapterCoordinate) {
        self.picker = Some(Picker::open(bible, current));
        self.visible = true;
    }

    pub fn close(&mut self) {
        self.visible = false;
        self.picker = None;
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, bible: &Bible) {
        if !self.visible {
            return;
        }
        let Some(picker) = &self.picker else {
            return;
        };

        let popup_area = centered_popup_area(area, 50, 80);
        frame.render_widget(Clear, popup_area);

        match picker.view() {
            PickerView::BookList => Self::render_book_list(frame, popup_area, bible, picker),
            PickerView::ChapterGrid(book_index) => {
                Self::render_chapter_grid(frame, popup_area, bible, picker, book_index);
            }
        }
    }

    fn render_book_list(frame: &mut Frame, popup_area: Rect, bible: &Bible, picker: &Picker) {
        let books = list_books(bible);
        if books.is_empty() {
            let empty_text = vec![
                Line::from("No books available"),
                Line::from(""),
                Line::from(Span::styled(
                    "Press any key to close",
                    Style::default().add_modifier(Modifier::ITALIC),
                )),
            ];
            let paragraph = Paragraph::new(empty_text)
                .style(Style::default().fg(Color::DarkGray))
                .block(Block::default().title("Books").borders(Borders::ALL));
            frame.render_widget(paragraph, popup_area);
            return;
        }

        // Keep the selection visible; the full canon has more books than
        // fit in the popup.
        let inner_height = popup_area.height.saturating_sub(2) as usize;
        let offset = picker
            .selected_book()
            .saturating_sub(inner_height.saturating_sub(1));

        let items: Vec<ListItem> = books
            .iter()
            .enumerate()
            .skip(offset)
            .take(inner_height.max(1))
            .map(|(i, name)| {
                let style = if i == picker.selected_book() {
                    Style::default().bg(Color::Blue).fg(Color::White)
                } else {
                    Style::default()
                };
                ListItem::new(Line::from(*name)).style(style)
            })
            .collect();

        let list =
            List::new(items).block(Block::default().title("Books").borders(Borders::ALL));
        frame.render_widget(list, popup_area);
    }

    fn render_chapter_grid(
        frame: &mut Frame,
        popup_area: Rect,
        bible: &Bible,
        picker: &Picker,
        book_index: usize,
    ) {
        let chapters = list_chapters(bible, book_index).unwrap_or_default();
        let title = bible
            .book(book_index)
            .map(|b| b.name.as_str())
            .unwrap_or("Chapters");

        let mut lines: Vec<Line> = Vec::new();
        for row in chapters.chunks(GRID_COLUMNS) {
            let mut spans: Vec<Span> = Vec::new();
            for &chapter in row {
                let style = if chapter as usize == picker.selected_chapter() + 1 {
                    Style::default().bg(Color::Blue).fg(Color::White)
                } else {
                    Style::default()
                };
                spans.push(Span::styled(format!("{chapter:>4}"), style));
                spans.push(Span::raw(" "));
            }
            lines.push(Line::from(spans));
        }

        let paragraph = Paragraph::new(lines)
            .block(Block::default().title(title).borders(Borders::ALL));
        frame.render_widget(paragraph, popup_area);
    }
}
