/*
CC-CEDICT Format

- encoded in utf-8, one entry per line
- lines starting with # are comments
- an entry looks like this:

    Traditional Simplified [pin1 yin1] /gloss 1/gloss 2/.../

- the pinyin uses tone numbers 1-5, u: for ü and is separated by spaces, punctuation
  (",", "·") is written as its own syllable
- glosses can contain inline references "trad|simp[pin1 yin1]" and some special glosses:
  * CL:個|个[ge4],位[wei4] lists the classifiers (measure words) of the word
  * also written 機槍|机枪 lists variant forms
  * also pronounced yyy, also pron. yyy, also pr. yyy gives an alternative reading

Frequency rank files have one word per line:

    rank frequency word

e.g. "1 35257.45 的"
*/

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::take_while1,
    character::complete::{char, digit0, digit1, multispace1, one_of, u32},
    combinator::{all_consuming, map_opt, map_res, recognize, rest, verify},
    sequence::{delimited, preceded},
};
use regex::{Captures, Regex};
use std::sync::LazyLock;

use crate::config;
use crate::pinyin;

static INLINE_PINYIN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[((?:[\w+:] *)+)\]").unwrap());
// a single word or a trad|simp pair
static HANZI_WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\x{4E00}-\x{9FA5}]+(?:\|[\x{4E00}-\x{9FA5}]+)?").unwrap()
});
static ALSO_PRONOUNCED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"also pronounced |also pron\. |also pr\. ").unwrap());

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct CedictLine<'a> {
    pub traditional: &'a str,
    pub simplified: &'a str,
    pub pinyin: &'a str,
    /// without the leading and trailing '/'
    pub glosses: &'a str,
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub struct RankLine<'a> {
    pub rank: u32,
    pub frequency: f64,
    pub word: &'a str,
}

/// The glosses of an entry, sorted into the plain English definitions and the special fields.
#[derive(Debug, PartialEq, Eq, Default)]
pub struct Glosses {
    pub english: Vec<String>,
    /// traditional form of each classifier
    pub classifiers: Vec<String>,
    /// "trad|simp" or a single form
    pub also_written: Vec<String>,
    pub also_pronounced: Option<String>,
}

impl Glosses {
    pub fn english_text(&self) -> String {
        self.english.join(config::GLOSS_SEP)
    }
}

fn cedict_word(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| !c.is_whitespace()).parse(input)
}

fn cedict_pinyin(input: &str) -> IResult<&str, &str> {
    delimited(char('['), take_while1(|c: char| c != ']'), char(']')).parse(input)
}

fn cedict_glosses(input: &str) -> IResult<&str, &str> {
    map_opt(preceded(char('/'), rest), |glosses: &str| {
        glosses
            .trim_end()
            .strip_suffix('/')
            .filter(|g| !g.is_empty())
    })
    .parse(input)
}

pub fn parse_cedict_line(line: &str) -> IResult<&str, CedictLine<'_>> {
    let (remainder, (traditional, _, simplified, _, pinyin, _, glosses)) = all_consuming((
        cedict_word,
        multispace1,
        cedict_word,
        multispace1,
        cedict_pinyin,
        multispace1,
        cedict_glosses,
    ))
    .parse(line)?;
    Ok((
        remainder,
        CedictLine {
            traditional,
            simplified,
            pinyin,
            glosses,
        },
    ))
}

fn rank_frequency(input: &str) -> IResult<&str, f64> {
    map_res(
        alt((recognize((digit0, char('.'), digit1)), digit1)),
        str::parse::<f64>,
    )
    .parse(input)
}

fn rank_word(input: &str) -> IResult<&str, &str> {
    verify(rest, |word: &str| !word.trim_end().is_empty())
        .map(str::trim_end)
        .parse(input)
}

pub fn parse_rank_line(line: &str) -> IResult<&str, RankLine<'_>> {
    let (remainder, (rank, _, frequency, _, word)) =
        all_consuming((u32, one_of(" \t"), rank_frequency, one_of(" \t"), rank_word))
            .parse(line)?;
    Ok((
        remainder,
        RankLine {
            rank,
            frequency,
            word,
        },
    ))
}

/// Chinese words and trad|simp pairs in the order they appear in a gloss.
pub fn hanzi_words(gloss: &str) -> impl Iterator<Item = &str> {
    HANZI_WORD.find_iter(gloss).map(|m| m.as_str())
}

/// Converts the inline pinyin of the glosses to display form and separates the special glosses
/// (classifiers, variants, alternative pronunciation) from the English definitions.
pub fn split_glosses(raw: &str) -> Glosses {
    let converted = INLINE_PINYIN.replace_all(raw, |caps: &Captures| {
        format!(" {}", pinyin::display_form(&caps[1]))
    });

    let mut glosses = Glosses::default();
    for gloss in converted.split(config::GLOSS_SEP) {
        if let Some(classifiers) = gloss.strip_prefix("CL:") {
            // only the traditional form of a trad|simp pair is kept
            glosses.classifiers.extend(
                hanzi_words(classifiers)
                    .filter_map(|word| word.split(config::WORD_SEP).next())
                    .map(str::to_owned),
            );
        } else if gloss.starts_with("also written ") {
            glosses
                .also_written
                .extend(hanzi_words(gloss).map(str::to_owned));
        } else if let Some(marker) = ALSO_PRONOUNCED.find(gloss) {
            glosses.also_pronounced = Some(gloss[marker.end()..].trim().to_owned());
        } else {
            glosses.english.push(gloss.to_owned());
        }
    }
    glosses
}
