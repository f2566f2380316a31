use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

use crate::pinyin::tone_of_marked;

static HAN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\p{Han}").unwrap());
// Full width latin letters stand in for acronyms inside Chinese words, e.g. ＵＳＢ手指
static HANZI_TEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\p{Han}\x{FF21}-\x{FF3A}\x{FF41}-\x{FF5A}]").unwrap());
static NUMBERED_SYLLABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-zÜü:][1-5]").unwrap());
static PUNCTUATION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[,·、]").unwrap());

/// How a search string is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextFormat {
    Hanzi,
    ToneMarked,
    Numbered,
    Toneless,
}

/// Checks are done in order, e.g. "lüē3" is tone marked, not numbered.
pub fn classify(text: &str) -> TextFormat {
    if HANZI_TEXT.is_match(text) {
        TextFormat::Hanzi
    } else if text.chars().any(|c| tone_of_marked(c).is_some()) {
        TextFormat::ToneMarked
    } else if NUMBERED_SYLLABLE.is_match(text) {
        TextFormat::Numbered
    } else {
        TextFormat::Toneless
    }
}

/// True if the text contains at least one Chinese character.
pub fn is_hanzi(text: &str) -> bool {
    HAN.is_match(text)
}

pub fn is_punctuation(text: &str) -> bool {
    PUNCTUATION.is_match(text)
}
