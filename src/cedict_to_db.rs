use rayon::prelude::*;
use rusqlite::{Connection, Error as SqliteError};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use std::collections::HashMap;
use std::io;

use crate::cedict_parser::{CedictLine, parse_cedict_line, parse_rank_line, split_glosses};
use crate::config;
use crate::lexicon::{Entry, Lexicon};
use crate::pinyin;

#[derive(Debug, Error)]
pub enum CedictToDbError {
    #[error("malformed entry: {0}")]
    MalformedLine(String),
    #[error("{word}: {tones} tone numbers but {components} components")]
    ToneCountMismatch {
        word: String,
        tones: usize,
        components: usize,
    },
    #[error(transparent)]
    Sqlite(#[from] SqliteError),
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, CedictToDbError>;

#[derive(Debug)]
pub struct CedictToDbErrorLine {
    /// 1-based
    pub line_num: usize,
    pub error: CedictToDbError,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub ranks: usize,
    pub entries: usize,
    pub ranked: usize,
    pub unranked: usize,
    pub malformed: usize,
}

/// Builds the lexicon row of a CEDICT line.
pub fn entry_from_line(line: &CedictLine, rank: u32) -> Result<Entry> {
    let parsed = pinyin::parse_entry(line.pinyin);
    // every syllable needs exactly one tone number and one component
    if parsed.tones.len() != parsed.components.len() {
        return Err(CedictToDbError::ToneCountMismatch {
            word: line.traditional.to_owned(),
            tones: parsed.tones.len(),
            components: parsed.components.len(),
        });
    }
    let glosses = split_glosses(line.glosses);
    Ok(Entry {
        traditional: line.traditional.to_owned(),
        simplified: line.simplified.to_owned(),
        pinyin_tonemarked: parsed.tone_marked_key.clone(),
        pinyin_toneless: parsed.toneless_key.clone(),
        tone_nums: parsed.tone_list(),
        component_pinyin: parsed.component_list(),
        pinyin: parsed.display,
        english: glosses.english_text(),
        also_written: glosses.also_written.join(config::LIST_SEP),
        also_pronounced: glosses.also_pronounced.unwrap_or_default(),
        classifiers: glosses.classifiers.join(config::LIST_SEP),
        rank,
    })
}

fn is_skipped(line: &str) -> bool {
    let line = line.trim();
    line.is_empty() || line.starts_with('#')
}

fn parse_line(line: &str, ranks: &HashMap<String, u32>) -> Result<Entry> {
    let (_, cedict_line) =
        parse_cedict_line(line).map_err(|_| CedictToDbError::MalformedLine(line.to_owned()))?;
    let rank = ranks
        .get(cedict_line.simplified)
        .copied()
        .unwrap_or(config::UNRANKED);
    let entry = entry_from_line(&cedict_line, rank)?;
    debug!(word = %entry.traditional, pinyin = %entry.pinyin, rank, "parsed entry");
    Ok(entry)
}

#[derive(Debug)]
pub struct CedictToDb<'a> {
    conn: &'a Connection,
    ranks: HashMap<String, u32>,
    ranked: usize,
    unranked: usize,
    pub errors: Vec<CedictToDbErrorLine>,
}

impl<'a> CedictToDb<'a> {
    pub fn new(conn: &'a Connection) -> Result<Self> {
        Lexicon::new(conn).create_tables()?;
        Ok(CedictToDb {
            conn,
            ranks: HashMap::new(),
            ranked: 0,
            unranked: 0,
            errors: vec![],
        })
    }

    /// Reads `rank frequency word` lines, returns the number of ranks loaded.
    pub fn load_ranks(&mut self, lines: impl IntoIterator<Item = String>) -> usize {
        let mut loaded = 0;
        for (idx, line) in lines.into_iter().enumerate() {
            if is_skipped(&line) {
                continue;
            }
            match parse_rank_line(&line) {
                Ok((_, rank_line)) => {
                    self.ranks.insert(rank_line.word.to_owned(), rank_line.rank);
                    loaded += 1;
                }
                Err(_) => warn!(line_num = idx + 1, %line, "malformed rank line"),
            }
        }
        info!(loaded, "ranks loaded");
        loaded
    }

    pub fn rank_of(&self, simplified: &str) -> u32 {
        self.ranks
            .get(simplified)
            .copied()
            .unwrap_or(config::UNRANKED)
    }

    /// Parses all lines and inserts the valid entries in one transaction. Malformed lines are
    /// collected in `errors`, only database errors abort the import.
    pub fn cedict_to_db(&mut self, lines: impl IntoIterator<Item = String>) -> Result<usize> {
        let lines: Vec<String> = lines.into_iter().collect();
        let ranks = &self.ranks;
        let parsed: Vec<(usize, Result<Entry>)> = lines
            .par_iter()
            .enumerate()
            .filter(|(_, line)| !is_skipped(line))
            .map(|(idx, line)| (idx + 1, parse_line(line, ranks)))
            .collect();

        self.conn
            .execute_batch(&format!("{} BEGIN TRANSACTION", config::IMPORT_PRAGMAS))?;
        let lexicon = Lexicon::new(self.conn);
        let mut inserted = 0;
        for (line_num, entry) in parsed {
            match entry {
                Ok(entry) => {
                    lexicon.insert(&entry)?;
                    if entry.rank == config::UNRANKED {
                        self.unranked += 1;
                    } else {
                        self.ranked += 1;
                    }
                    inserted += 1;
                }
                Err(error) => {
                    warn!(line_num, %error, "skipping line");
                    self.errors.push(CedictToDbErrorLine { line_num, error });
                }
            }
        }
        self.conn.execute("COMMIT", ())?;
        info!(
            inserted,
            ranked = self.ranked,
            unranked = self.unranked,
            malformed = self.errors.len(),
            "import finished"
        );
        Ok(inserted)
    }

    pub fn summary(&self) -> ImportSummary {
        ImportSummary {
            ranks: self.ranks.len(),
            entries: self.ranked + self.unranked,
            ranked: self.ranked,
            unranked: self.unranked,
            malformed: self.errors.len(),
        }
    }
}
