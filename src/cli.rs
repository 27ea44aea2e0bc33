use clap::{ArgAction, Parser};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    name = "litebible",
    version,
    about = "A plain-text Bible reader with infinite chapter scrolling.",
    long_about = None
)]
pub struct Cli {
    /// Bible dataset file (JSON array of [name, chapters] pairs)
    #[clap(name = "DATASET")]
    pub dataset: Option<PathBuf>,

    /// Fetch the full dataset from a URL (cached locally)
    #[clap(short = 'u', long, value_name = "URL")]
    pub url: Option<String>,

    /// Jump to a position on startup, e.g. "John" or "John:3"
    #[clap(short = 'g', long = "goto", value_name = "BOOK[:CHAPTER]")]
    pub goto: Option<String>,

    /// Dump a chapter as plain text and exit (requires --goto)
    #[clap(short, long)]
    pub dump: bool,

    /// Use a specific configuration file
    #[clap(short = 'c', long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv)
    #[clap(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Enable debug output
    #[clap(long)]
    pub debug: bool,
}

impl Cli {
    /// Parse "Book" or "Book:chapter" into a name and a 1-based chapter.
    pub fn parse_goto(spec: &str) -> (String, Option<u32>) {
        match spec.rsplit_once(':') {
            Some((book, chapter)) => match chapter.trim().parse::<u32>() {
                Ok(n) if n > 0 => (book.trim().to_string(), Some(n)),
                _ => (spec.trim().to_string(), None),
            },
            None => (spec.trim().to_string(), None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_goto_book_only() {
        assert_eq!(Cli::parse_goto("John"), ("John".to_string(), None));
    }

    #[test]
    fn test_parse_goto_book_and_chapter() {
        assert_eq!(Cli::parse_goto("John:3"), ("John".to_string(), Some(3)));
        assert_eq!(Cli::parse_goto(" Song of Songs : 2 "), ("Song of Songs".to_string(), Some(2)));
    }

    #[test]
    fn test_parse_goto_bad_chapter_falls_back_to_name() {
        assert_eq!(Cli::parse_goto("John:0"), ("John:0".to_string(), None));
        assert_eq!(Cli::parse_goto("John:x"), ("John:x".to_string(), None));
    }
}
