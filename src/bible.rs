use crate::logging;
use eyre::{Result, WrapErr};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// A single book of the Bible. The external dataset encodes books as
/// `[name, chapters]` pairs; each chapter is an array of verse strings with
/// implicit 1-based numbering.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "(String, Vec<Vec<String>>)")]
pub struct Book {
    pub name: String,
    pub chapters: Vec<Vec<String>>,
}

impl From<(String, Vec<Vec<String>>)> for Book {
    fn from((name, chapters): (String, Vec<Vec<String>>)) -> Self {
        Self { name, chapters }
    }
}

/// The whole dataset: books in canonical order, immutable for the session.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(transparent)]
pub struct Bible {
    books: Vec<Book>,
}

impl Bible {
    pub fn new(books: Vec<Book>) -> Self {
        Self { books }
    }

    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).wrap_err("malformed Bible dataset")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .wrap_err_with(|| format!("cannot read dataset {}", path.display()))?;
        Self::from_json(&text)
    }

    pub fn books(&self) -> &[Book] {
        &self.books
    }

    pub fn book(&self, index: usize) -> Option<&Book> {
        self.books.get(index)
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    /// Verses of one chapter, or `None` when either index is out of range.
    pub fn verses(&self, book: usize, chapter: usize) -> Option<&[String]> {
        self.books
            .get(book)?
            .chapters
            .get(chapter)
            .map(|v| v.as_slice())
    }

    /// Canonical index of a book by name. Used to re-anchor the reading
    /// position when a bootstrap subset is swapped for the full dataset.
    pub fn position_of_book(&self, name: &str) -> Option<usize> {
        self.books.iter().position(|b| b.name == name)
    }

    pub fn chapter_count(&self) -> usize {
        self.books.iter().map(|b| b.chapters.len()).sum()
    }
}

pub const DATA_CACHE_FILE: &str = "litebible-data.json";
pub const DATA_VERSION_FILE: &str = "litebible-version";
pub const DATA_VERSION: &str = "1.0";

/// Fetch the full dataset from `url`, preferring a cache under `cache_dir`.
///
/// The cache is only honored when its version marker matches
/// [`DATA_VERSION`]. A failed cache write is not an error; the fetched data
/// is still returned.
pub fn fetch_cached(url: &str, cache_dir: &Path) -> Result<Bible> {
    let data_path = cache_dir.join(DATA_CACHE_FILE);
    let version_path = cache_dir.join(DATA_VERSION_FILE);

    if let Ok(version) = fs::read_to_string(&version_path)
        && version.trim() == DATA_VERSION
        && let Ok(text) = fs::read_to_string(&data_path)
        && let Ok(bible) = Bible::from_json(&text)
    {
        logging::debug(format!("dataset cache hit: {}", data_path.display()));
        return Ok(bible);
    }

    let text = reqwest::blocking::get(url)
        .wrap_err_with(|| format!("fetching dataset from {url}"))?
        .error_for_status()?
        .text()?;
    let bible = Bible::from_json(&text)?;

    if let Err(err) = fs::create_dir_all(cache_dir)
        .and_then(|_| fs::write(&data_path, &text))
        .and_then(|_| fs::write(&version_path, DATA_VERSION))
    {
        logging::warn(format!("dataset cache write failed: {err}"));
    }

    Ok(bible)
}
