use zhdict::cedict_to_db::CedictToDb;
use zhdict::db_check;
use zhdict::lexicon::Lexicon;
use zhdict::pinyin;
use zhdict::text_format;

use clap::{Parser, Subcommand};
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, anyhow, bail};
use rusqlite::{Connection, backup};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

#[derive(Parser)]
#[command(name = "zhdict")]
#[command(version = "0.1.0")]
#[command(about = "Pinyin conversion and CC-CEDICT lexicon tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Builds a lexicon (.db, sqlite) from a CC-CEDICT file
    Import {
        /// CC-CEDICT file, utf-8
        cedict_file: PathBuf,

        /// Output as .db file (sqlite)
        #[arg(short, long)]
        db: PathBuf,

        /// Word frequency list, lines of "rank frequency word"
        #[arg(short, long)]
        ranks: Option<PathBuf>,

        /// Write the import counts as .json file
        #[arg(long)]
        summary: Option<PathBuf>,
    },
    /// Checks the consistency of a lexicon
    Check { db: PathBuf },
    /// Searches Chinese (hanzi or any pinyin) or English
    Search {
        db: PathBuf,
        query: String,

        #[arg(short, long)]
        english: bool,
    },
    /// Shows definitions, classifiers and characters of a word
    Details { db: PathBuf, id: i64 },
    /// Converts numbered pinyin, e.g. "ni3 hao3"
    Convert { text: String },
}

#[derive(Serialize)]
struct Conversion {
    format: text_format::TextFormat,
    display: String,
    tone_marked_key: String,
    toneless_key: String,
    tones: String,
}

fn read_lines(path: &Path) -> anyhow::Result<Vec<String>> {
    let file = File::open(path).context(format!("Could not open file {}", path.display()))?;
    let lines = BufReader::new(file)
        .lines()
        .collect::<Result<Vec<_>, _>>()
        .context(format!("Could not read file {}", path.display()))?;
    Ok(lines)
}

/// In-memory copy of a lexicon, the file is never modified.
fn open_db(path: &Path) -> anyhow::Result<Connection> {
    if !path.exists() {
        bail!("Lexicon {} does not exist", path.display());
    }
    let mut conn = Connection::open_in_memory()?;
    let input_conn = Connection::open(path)
        .context(format!("Could not open sqlite file {}", path.display()))?;
    {
        let backup = backup::Backup::new(&input_conn, &mut conn)?;
        backup.run_to_completion(4000, Duration::new(0, 0), None)?;
    }
    Ok(conn)
}

fn import(
    cedict_file: &Path,
    db: &Path,
    ranks: Option<&Path>,
    summary: Option<&Path>,
) -> anyhow::Result<()> {
    if cedict_file == db {
        bail!("Input file and output file must be different");
    }
    let conn = Connection::open_in_memory()?;
    let mut cedict_to_db = CedictToDb::new(&conn)?;
    if let Some(ranks) = ranks {
        cedict_to_db.load_ranks(read_lines(ranks)?);
    }
    cedict_to_db.cedict_to_db(read_lines(cedict_file)?)?;
    for err in &cedict_to_db.errors {
        eprintln!("line {}: {}", err.line_num, err.error);
    }

    let mut db_out = Connection::open(db)
        .context(format!("Could not create output file {}", db.display()))?;
    let backup = backup::Backup::new(&conn, &mut db_out)?;
    backup.run_to_completion(4000, Duration::new(0, 0), None)?;
    info!(path = %db.display(), "lexicon written");

    if let Some(path) = summary {
        let s = serde_json::to_string_pretty(&cedict_to_db.summary())?;
        fs::write(path, s).context(format!("Could not write {}", path.display()))?;
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    let cli = Cli::parse();
    match &cli.command {
        Command::Import {
            cedict_file,
            db,
            ranks,
            summary,
        } => import(cedict_file, db, ranks.as_deref(), summary.as_deref()),
        Command::Check { db } => {
            let conn = open_db(db)?;
            let errors = db_check::check_entries(&conn)?;
            for err in &errors {
                eprintln!("{err}");
            }
            if errors.is_empty() {
                Ok(())
            } else {
                warn!(count = errors.len(), "check failed");
                Err(anyhow!("Failure!"))
            }
        }
        Command::Search { db, query, english } => {
            let conn = open_db(db)?;
            let lexicon = Lexicon::new(&conn);
            let rows = if *english {
                lexicon.search_english(query)?
            } else {
                lexicon.search_chinese(query)?
            };
            println!("{}", serde_json::to_string_pretty(&rows)?);
            Ok(())
        }
        Command::Details { db, id } => {
            let conn = open_db(db)?;
            let details = Lexicon::new(&conn)
                .details(*id)?
                .ok_or_else(|| anyhow!("No word with id {id}"))?;
            println!("{}", serde_json::to_string_pretty(&details)?);
            Ok(())
        }
        Command::Convert { text } => {
            let parsed = pinyin::parse_entry(text);
            let conversion = Conversion {
                format: text_format::classify(text),
                tones: parsed.tone_list(),
                display: parsed.display,
                tone_marked_key: pinyin::tone_marked_search_key(text),
                toneless_key: pinyin::toneless_search_key(text),
            };
            println!("{}", serde_json::to_string_pretty(&conversion)?);
            Ok(())
        }
    }
}
