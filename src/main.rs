use litebible::{
    bible::{self, Bible},
    cli::Cli,
    config::{Config, get_app_data_prefix},
    logging::{self, LogLevel},
    ui::reader::Reader,
};

use clap::Parser;
use eyre::Result;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let verbosity = if cli.debug { 2 } else { cli.verbose };
    logging::init(LogLevel::from_verbosity(verbosity));

    let config = match cli.config.clone() {
        Some(filepath) => Config::load_from(filepath)?,
        None => match Config::new() {
            Ok(config) => config,
            Err(err) => {
                logging::warn(format!("could not load the configuration: {err}"));
                logging::warn("starting with default settings");
                Config::load_from("configuration.json".into())?
            }
        },
    };

    // A local file is the bootstrap dataset; with no file the URL is fetched
    // up front (cached after the first run).
    let (dataset, dataset_id) = match (&cli.dataset, &cli.url) {
        (Some(path), _) => (Bible::load(path)?, path.display().to_string()),
        (None, Some(url)) => {
            let cache_dir = get_app_data_prefix()?;
            (bible::fetch_cached(url, &cache_dir)?, url.clone())
        }
        (None, None) => {
            eyre::bail!("no dataset given; pass a JSON file or --url (see --help)")
        }
    };

    if cli.dump {
        return dump_chapter(&dataset, cli.goto.as_deref());
    }

    // When both a file and a URL are given, the file opens immediately and
    // the full dataset is swapped in once the fetch lands.
    let fetch_url = cli.dataset.is_some().then(|| cli.url.clone()).flatten();

    let mut reader = Reader::new(config, dataset, dataset_id, fetch_url)?;
    reader.run(cli.goto.as_deref())
}

fn dump_chapter(dataset: &Bible, goto: Option<&str>) -> Result<()> {
    let Some(spec) = goto else {
        eyre::bail!("--dump requires --goto BOOK[:CHAPTER]")
    };
    let (name, chapter) = Cli::parse_goto(spec);
    let book_index = dataset
        .position_of_book(&name)
        .ok_or_else(|| eyre::eyre!("unknown book: {name}"))?;
    let chapter_number = chapter.unwrap_or(1);
    let verses = dataset
        .verses(book_index, chapter_number.saturating_sub(1) as usize)
        .ok_or_else(|| eyre::eyre!("no chapter {chapter_number} in {name}"))?;

    println!("{} {}", name, chapter_number);
    println!();
    for (i, verse) in verses.iter().enumerate() {
        println!("{:>3} {}", i + 1, verse);
    }
    Ok(())
}
