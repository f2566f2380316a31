use regex::Regex;
use rusqlite::{Connection, Error as SqliteError};

use std::sync::LazyLock;

use crate::common::{format_word, split_list};

static HAN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\p{Han}+$").unwrap());

/// Consistency checks over all lexicon rows, returns one message per problem.
pub fn check_entries(conn: &Connection) -> Result<Vec<String>, SqliteError> {
    let mut errors = vec![];
    let mut stmt = conn.prepare(
        "SELECT traditional, simplified, pinyin, tone_nums, component_pinyin FROM words ORDER BY word_rank",
    )?;
    let mut rows = stmt.query([])?;

    while let Some(row) = rows.next()? {
        let trad: String = row.get("traditional")?;
        let simp: String = row.get("simplified")?;
        let pinyin: String = row.get("pinyin")?;
        let tone_nums: String = row.get("tone_nums")?;
        let component_pinyin: String = row.get("component_pinyin")?;
        let word = format_word(&trad, &simp);

        if trad.chars().count() != simp.chars().count() {
            errors.push(format!(
                "different numbers of characters, traditional: {trad} simplified: {simp}"
            ));
            continue;
        }

        let tones = split_list(&tone_nums);
        if tones.len() != split_list(&component_pinyin).len() {
            errors.push(format!(
                "tone numbers and components differ: {word} tones: {tone_nums} components: {component_pinyin}"
            ));
            continue;
        }
        if let Some(tone) = tones.iter().find(|t| !matches!(**t, "1" | "2" | "3" | "4" | "5")) {
            errors.push(format!("invalid tone number {tone}: {word}"));
        }

        // words with latin letters or punctuation are not checked
        if HAN.is_match(&trad) {
            let possible_erhuas = trad.chars().filter(|c| *c == '兒').count();
            let num_trad_chars = trad.chars().count();
            let expected_syllables = num_trad_chars - possible_erhuas..num_trad_chars + 1;
            if !expected_syllables.contains(&tones.len()) {
                errors.push(format!(
                    "pinyin syllables don't match number of characters: {word} pinyin: {pinyin}"
                ));
            }
        }
    }
    Ok(errors)
}
