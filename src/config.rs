/// Separator of the definitions in the english field, as in CC-CEDICT.
pub const GLOSS_SEP: &str = "/";
/// Separator of list fields (classifiers, tone numbers, components, ...).
pub const LIST_SEP: &str = ",";
/// Separator of a traditional|simplified pair.
pub const WORD_SEP: &str = "|";

/// Rank of words which are missing from the frequency list.
pub const UNRANKED: u32 = 999_999;

/// English queries shorter than this are likely to match an enormous number of useless rows,
/// so they are limited to SHORT_QUERY_LIMIT results.
pub const SHORT_QUERY_LEN: usize = 3;
pub const SHORT_QUERY_LIMIT: u32 = 50;

pub const IMPORT_PRAGMAS: &str = "PRAGMA synchronous = OFF; PRAGMA journal_mode = MEMORY;";

/* The FTS3 simple tokenizer treats every non ASCII character as part of a token, so the
pinyin keys and the hanzi columns are matched as whole words (or prefixes with "*").

pinyin: display form, e.g. "shí tou, jiǎn zi, bù"
pinyin_spaceless: tone marked search key, e.g. "shítoujiǎnzibù"
pinyin_toneless: toneless search key, e.g. "shitoujianzibu"
english: definitions separated by "/"
also_written_as, classifiers: comma separated hanzi or trad|simp pairs
tone_nums, component_pinyin: comma separated, one item per syllable
word_rank: frequency rank, 999999 if unknown */
pub const DB_SCHEMA: &str = r#"
CREATE VIRTUAL TABLE IF NOT EXISTS words USING fts3 (
	traditional text,
	simplified text,
	pinyin text,
	pinyin_spaceless text,
	pinyin_toneless text,
	english text,
	also_written_as text,
	also_pronounced_as text,
	classifiers text,
	tone_nums text,
	component_pinyin text,
	word_rank integer
);
"#;
