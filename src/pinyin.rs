use itertools::Itertools;

pub const NEUTRAL_TONE: u8 = 5;

/// Vowel clusters in priority order, with the offset of the vowel that carries the tone mark.
/// All two vowel clusters must come before the single vowels.
const TONE_MARK_POSITIONS: [(&[char], usize); 19] = [
    (&['a', 'i'], 0),
    (&['a', 'o'], 0),
    (&['e', 'i'], 0),
    (&['o', 'u'], 0),
    (&['i', 'a'], 1),
    (&['i', 'e'], 1),
    (&['i', 'u'], 1),
    (&['i', 'o'], 1),
    (&['u', 'a'], 1),
    (&['u', 'e'], 1),
    (&['u', 'i'], 1),
    (&['u', 'o'], 1),
    (&['ü', 'e'], 1),
    (&['a'], 0),
    (&['e'], 0),
    (&['i'], 0),
    (&['o'], 0),
    (&['u'], 0),
    (&['ü'], 0),
];

// Rows are positionally aligned with TONE_MARK_SOURCE.
const TONE_MARK_SOURCE: [char; 12] = ['a', 'o', 'e', 'i', 'u', 'ü', 'A', 'O', 'E', 'I', 'U', 'Ü'];
const TONE_MARKS: [[char; 12]; 4] = [
    ['ā', 'ō', 'ē', 'ī', 'ū', 'ǖ', 'Ā', 'Ō', 'Ē', 'Ī', 'Ū', 'Ǖ'],
    ['á', 'ó', 'é', 'í', 'ú', 'ǘ', 'Á', 'Ó', 'É', 'Í', 'Ú', 'Ǘ'],
    ['ǎ', 'ǒ', 'ě', 'ǐ', 'ǔ', 'ǚ', 'Ǎ', 'Ǒ', 'Ě', 'Ǐ', 'Ǔ', 'Ǚ'],
    ['à', 'ò', 'è', 'ì', 'ù', 'ǜ', 'À', 'Ò', 'È', 'Ì', 'Ù', 'Ǜ'],
];

/// Pinyin of a dictionary entry in all the forms stored in the lexicon.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedPinyin {
    /// e.g. "Ài ěr lán", "shí tou, jiǎn zi, bù"
    pub display: String,
    /// e.g. "àiěrlán"
    pub tone_marked_key: String,
    /// e.g. "aierlan"
    pub toneless_key: String,
    /// one tone number (1-5) per syllable
    pub tones: Vec<u8>,
    /// one lowercase tone marked syllable per syllable
    pub components: Vec<String>,
}

impl ParsedPinyin {
    pub fn tone_list(&self) -> String {
        self.tones.iter().join(",")
    }

    pub fn component_list(&self) -> String {
        self.components.join(",")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Syllable<'a> {
    pub text: &'a str,
    pub tone: u8,
}

/// Splits free text into syllables: a single digit or a run of latin letters (including ':'),
/// either optionally followed by a tone number 1-5. Anything else separates syllables.
#[derive(Debug, Clone)]
pub struct Syllables<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Syllables<'a> {
    pub fn new(text: &'a str) -> Self {
        Syllables { text, pos: 0 }
    }
}

impl<'a> Iterator for Syllables<'a> {
    type Item = Syllable<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let rest = &self.text[self.pos..];
        let (start, first) = rest
            .char_indices()
            .find(|&(_, c)| c.is_ascii_digit() || is_syllable_letter(c))?;
        let mut end = start + first.len_utf8();
        if !first.is_ascii_digit() {
            end += rest[end..]
                .char_indices()
                .find(|&(_, c)| !is_syllable_letter(c))
                .map_or(rest.len() - end, |(i, _)| i);
        }
        let text = &rest[start..end];
        let mut tone = NEUTRAL_TONE;
        if let Some(digit) = rest[end..].chars().next().filter(|c| ('1'..='5').contains(c)) {
            tone = digit as u8 - b'0';
            end += 1;
        }
        self.pos += end;
        Some(Syllable { text, tone })
    }
}

fn is_syllable_letter(c: char) -> bool {
    c.is_ascii_alphabetic() || ('\u{00C0}'..='\u{024F}').contains(&c) || c == ':'
}

fn lowercase_char(c: char) -> char {
    let mut lower = c.to_lowercase();
    match (lower.next(), lower.next()) {
        (Some(l), None) => l,
        _ => c,
    }
}

/// Rewrites the alternative spellings of ü. A lone "v" is left alone, it is much more likely the
/// letter of an acronym (e.g. VCR) than ü.
fn normalize_u_umlaut(syllable: &str) -> String {
    let syllable = syllable.replace("u:", "ü").replace("U:", "Ü");
    if syllable.chars().count() > 1 {
        syllable.replace('v', "ü").replace('V', "Ü")
    } else {
        syllable
    }
}

/// Puts the tone mark for `tone` on the right vowel of a single syllable, keeping its case.
/// Neutral tone (5) and anything outside 1-4 leave the syllable unchanged, as do syllables
/// without a vowel.
pub fn insert_tone_mark(syllable: &str, tone: u8) -> String {
    if !(1..=4).contains(&tone) {
        return syllable.to_owned();
    }
    let mut chars: Vec<char> = syllable.chars().collect();
    let lower: Vec<char> = chars.iter().map(|&c| lowercase_char(c)).collect();
    let mark_pos = TONE_MARK_POSITIONS.iter().find_map(|(cluster, offset)| {
        lower
            .windows(cluster.len())
            .position(|window| window == *cluster)
            .map(|start| start + offset)
    });
    let Some(mark_pos) = mark_pos else {
        return syllable.to_owned();
    };
    let Some(column) = TONE_MARK_SOURCE.iter().position(|&c| c == chars[mark_pos]) else {
        unreachable!(
            "tone mark tables out of sync, no glyph for '{}' in '{}'",
            chars[mark_pos], syllable
        );
    };
    chars[mark_pos] = TONE_MARKS[usize::from(tone - 1)][column];
    chars.into_iter().collect()
}

/// Returns the unmarked vowel and the tone number of a tone marked vowel.
pub fn tone_of_marked(c: char) -> Option<(char, u8)> {
    TONE_MARKS.iter().zip(1..).find_map(|(row, tone)| {
        row.iter()
            .position(|&m| m == c)
            .map(|column| (TONE_MARK_SOURCE[column], tone))
    })
}

/// Tone numbers of all marked vowels, e.g. "nǐ hǎo ma" -> [3, 3].
pub fn tone_numbers_from_marked(text: &str) -> Vec<u8> {
    text.chars()
        .filter_map(tone_of_marked)
        .map(|(_, tone)| tone)
        .collect()
}

fn search_key(text: &str, with_tone_marks: bool) -> String {
    let mut key = String::with_capacity(text.len());
    for syllable in Syllables::new(text) {
        let normalized = normalize_u_umlaut(&syllable.text.to_lowercase());
        if with_tone_marks {
            key.push_str(&insert_tone_mark(&normalized, syllable.tone));
        } else {
            // the toneless search treats ü and u identically
            key.push_str(&normalized.replace('ü', "u"));
        }
    }
    key
}

/// e.g. "ni3 hao3" -> "nǐhǎo"
pub fn tone_marked_search_key(text: &str) -> String {
    search_key(text, true)
}

/// e.g. "ni3 hao3" -> "nihao"
pub fn toneless_search_key(text: &str) -> String {
    search_key(text, false)
}

/// e.g. "U S B shou3 zhi3" -> "USB shǒu zhǐ"
pub fn display_form(text: &str) -> String {
    parse_entry(text).display
}

fn split_tone_number(token: &str) -> (&str, u8) {
    if token.chars().count() > 1 {
        if let Some(base) = token.strip_suffix(|c: char| ('1'..='5').contains(&c)) {
            let tone = token.as_bytes()[base.len()] - b'0';
            return (base, tone);
        }
    }
    (token, NEUTRAL_TONE)
}

/// Converts the space separated numbered pinyin of a CEDICT entry into all stored forms.
pub fn parse_entry(text: &str) -> ParsedPinyin {
    let mut parsed = ParsedPinyin::default();
    for token in text.split(' ').filter(|t| !t.is_empty()) {
        match token {
            "·" => parsed.display.push_str(" ·"),
            "," => parsed.display.push(','),
            _ => {
                let (base, tone) = split_tone_number(token);
                let syllable = normalize_u_umlaut(base);
                let marked = insert_tone_mark(&syllable, tone);
                // single letters are digits or letters of acronyms and stay glued together
                if syllable.chars().count() > 1 && !parsed.display.is_empty() {
                    parsed.display.push(' ');
                }
                parsed.display.push_str(&marked);
                let marked_lower = marked.to_lowercase();
                parsed.tone_marked_key.push_str(&marked_lower);
                parsed
                    .toneless_key
                    .push_str(&syllable.to_lowercase().replace('ü', "u"));
                parsed.tones.push(tone);
                parsed.components.push(marked_lower);
            }
        }
    }
    debug_assert_eq!(parsed.tones.len(), parsed.components.len());
    parsed
}
