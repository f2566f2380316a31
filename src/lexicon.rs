use rusqlite::{Connection, Error as SqliteError, OptionalExtension, Row};
use serde::Serialize;
use tracing::{debug, warn};

use crate::cedict_parser::hanzi_words;
use crate::common::{SqliteId, split_list};
use crate::config;
use crate::pinyin;
use crate::text_format::{TextFormat, classify, is_hanzi, is_punctuation};

/// One row of the lexicon, as produced by the CEDICT import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    pub traditional: String,
    pub simplified: String,
    /// display pinyin, e.g. "Ài ěr lán"
    pub pinyin: String,
    /// e.g. "àiěrlán"
    pub pinyin_tonemarked: String,
    /// e.g. "aierlan"
    pub pinyin_toneless: String,
    pub english: String,
    pub also_written: String,
    pub also_pronounced: String,
    pub classifiers: String,
    pub tone_nums: String,
    pub component_pinyin: String,
    pub rank: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LexiconRow {
    pub id: SqliteId,
    #[serde(flatten)]
    pub entry: Entry,
}

/// Indexed columns which can be searched with `Lexicon::search_column`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Traditional,
    Simplified,
    PinyinTonemarked,
    PinyinToneless,
    English,
    Classifiers,
}

impl Column {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Traditional => "traditional",
            Self::Simplified => "simplified",
            Self::PinyinTonemarked => "pinyin_spaceless",
            Self::PinyinToneless => "pinyin_toneless",
            Self::English => "english",
            Self::Classifiers => "classifiers",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Definition {
    pub english: String,
    pub inline_chinese: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassifierInfo {
    pub traditional: String,
    pub simplified: String,
    pub pinyin: String,
    pub tone_nums: String,
    /// only the "classifier for ..." definitions if there are any
    pub english: String,
}

/// A single character of a word with the reading it has in that word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Component {
    pub traditional: String,
    pub simplified: String,
    pub pinyin: String,
    pub tone_nums: String,
    pub english: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WordDetails {
    pub id: SqliteId,
    pub entry: Entry,
    pub definitions: Vec<Definition>,
    pub classifiers: Vec<ClassifierInfo>,
    pub components: Vec<Component>,
}

const INSERT_WORD: &str = "INSERT INTO words VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)";
const SELECT_BY_ID: &str = "SELECT rowid, * FROM words WHERE rowid = ?1";
const SELECT_TRADITIONAL: &str =
    "SELECT rowid, * FROM words WHERE traditional MATCH ?1 ORDER BY word_rank ASC";

fn entry_from_row(row: &Row) -> Result<Entry, SqliteError> {
    Ok(Entry {
        traditional: row.get("traditional")?,
        simplified: row.get("simplified")?,
        pinyin: row.get("pinyin")?,
        pinyin_tonemarked: row.get("pinyin_spaceless")?,
        pinyin_toneless: row.get("pinyin_toneless")?,
        english: row.get("english")?,
        also_written: row.get("also_written_as")?,
        also_pronounced: row.get("also_pronounced_as")?,
        classifiers: row.get("classifiers")?,
        tone_nums: row.get("tone_nums")?,
        component_pinyin: row.get("component_pinyin")?,
        rank: row.get("word_rank")?,
    })
}

fn lexicon_row(row: &Row) -> Result<LexiconRow, SqliteError> {
    Ok(LexiconRow {
        id: row.get(0)?,
        entry: entry_from_row(row)?,
    })
}

/// With several readings of a character, surnames and abbreviations are skipped and the pinyin
/// has to match the reading in the word.
fn is_reasonable_match(candidate: &Entry, pinyin: &str) -> bool {
    if candidate.english.starts_with("surname") || candidate.english.contains("abbr.") {
        return false;
    }
    pinyin == candidate.pinyin || pinyin == candidate.pinyin_toneless
}

#[derive(Debug)]
pub struct Lexicon<'a> {
    conn: &'a Connection,
}

impl<'a> Lexicon<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Lexicon { conn }
    }

    pub fn create_tables(&self) -> Result<(), SqliteError> {
        self.conn.execute_batch(config::DB_SCHEMA)
    }

    pub fn insert(&self, entry: &Entry) -> Result<SqliteId, SqliteError> {
        let mut stmt = self.conn.prepare_cached(INSERT_WORD)?;
        stmt.execute((
            &entry.traditional,
            &entry.simplified,
            &entry.pinyin,
            &entry.pinyin_tonemarked,
            &entry.pinyin_toneless,
            &entry.english,
            &entry.also_written,
            &entry.also_pronounced,
            &entry.classifiers,
            &entry.tone_nums,
            &entry.component_pinyin,
            entry.rank,
        ))?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get(&self, id: SqliteId) -> Result<Option<LexiconRow>, SqliteError> {
        let mut stmt = self.conn.prepare_cached(SELECT_BY_ID)?;
        stmt.query_row((id,), lexicon_row).optional()
    }

    pub fn count(&self) -> Result<u32, SqliteError> {
        self.conn
            .query_row("SELECT COUNT(*) FROM words", [], |row| row.get(0))
    }

    /// Full text match on a single column, best ranked words first.
    pub fn search_column(
        &self,
        column: Column,
        query: &str,
        limit: Option<u32>,
    ) -> Result<Vec<LexiconRow>, SqliteError> {
        let sql = format!(
            "SELECT rowid, * FROM words WHERE {} MATCH ?1 ORDER BY word_rank ASC LIMIT ?2",
            column.name()
        );
        let mut stmt = self.conn.prepare_cached(&sql)?;
        let rows = stmt.query_map((query, limit.map_or(-1, i64::from)), lexicon_row)?;
        let result: Result<Vec<LexiconRow>, SqliteError> = rows.collect();
        match result {
            // stray quotes or operators in the query text find nothing
            Err(SqliteError::SqliteFailure(_, Some(msg))) if msg.contains("malformed MATCH") => {
                debug!(query, %msg, "invalid full text query");
                Ok(vec![])
            }
            result => result,
        }
    }

    /// Searches hanzi (simplified first, then traditional), any kind of pinyin, or with a "CL:"
    /// prefix the words using a classifier.
    pub fn search_chinese(&self, search: &str) -> Result<Vec<LexiconRow>, SqliteError> {
        if search.is_empty() {
            return Ok(vec![]);
        }
        let text_format = classify(search);
        debug!(search, ?text_format, "searching chinese");

        let rows = match text_format {
            TextFormat::Hanzi => {
                if let Some(classifier) = search.strip_prefix("CL:") {
                    self.search_column(Column::Classifiers, &format!("{classifier}*"), None)?
                } else {
                    let query = format!("{search}*");
                    let rows = self.search_column(Column::Simplified, &query, None)?;
                    if rows.is_empty() {
                        self.search_column(Column::Traditional, &query, None)?
                    } else {
                        rows
                    }
                }
            }
            TextFormat::Toneless => {
                let query = pinyin::toneless_search_key(&compact_query(search));
                self.search_column(Column::PinyinToneless, &query, None)?
            }
            TextFormat::Numbered => {
                let query = pinyin::tone_marked_search_key(&compact_query(search));
                self.search_column(Column::PinyinTonemarked, &query, None)?
            }
            TextFormat::ToneMarked => {
                self.search_column(Column::PinyinTonemarked, &compact_query(search), None)?
            }
        };
        debug!(results = rows.len(), "search done");
        Ok(rows)
    }

    pub fn search_english(&self, search: &str) -> Result<Vec<LexiconRow>, SqliteError> {
        if search.is_empty() {
            return Ok(vec![]);
        }
        let limit = (search.chars().count() < config::SHORT_QUERY_LEN)
            .then_some(config::SHORT_QUERY_LIMIT);
        self.search_column(Column::English, search, limit)
    }

    pub fn details(&self, id: SqliteId) -> Result<Option<WordDetails>, SqliteError> {
        let Some(LexiconRow { id, entry }) = self.get(id)? else {
            return Ok(None);
        };
        let definitions = entry
            .english
            .split(config::GLOSS_SEP)
            .map(|english| Definition {
                english: english.to_owned(),
                inline_chinese: hanzi_words(english).map(str::to_owned).collect(),
            })
            .collect();
        let mut classifiers = vec![];
        for classifier in split_list(&entry.classifiers) {
            if let Some(info) = self.classifier_info(classifier)? {
                classifiers.push(info);
            }
        }
        let components = self.component_characters(&entry)?;
        Ok(Some(WordDetails {
            id,
            entry,
            definitions,
            classifiers,
            components,
        }))
    }

    /// Looks up a classifier (always a traditional character), preferring the reading which is
    /// defined as "classifier for ...".
    pub fn classifier_info(&self, classifier: &str) -> Result<Option<ClassifierInfo>, SqliteError> {
        let mut stmt = self.conn.prepare_cached(SELECT_TRADITIONAL)?;
        let mut rows = stmt.query((classifier,))?;
        let mut found: Option<Entry> = None;
        while let Some(row) = rows.next()? {
            let entry = entry_from_row(row)?;
            let is_classifier = entry.english.contains("classifier for");
            found = Some(entry);
            if is_classifier {
                break;
            }
        }
        let Some(entry) = found.filter(|e| !e.english.is_empty()) else {
            return Ok(None);
        };
        let classifier_defs: Vec<&str> = entry
            .english
            .split(config::GLOSS_SEP)
            .filter(|def| def.starts_with("classifier"))
            .collect();
        let english = if classifier_defs.is_empty() {
            entry.english.clone()
        } else {
            classifier_defs.join(";  ")
        };
        Ok(Some(ClassifierInfo {
            traditional: classifier.to_owned(),
            simplified: entry.simplified,
            pinyin: entry.pinyin,
            tone_nums: entry.tone_nums,
            english,
        }))
    }

    /// Splits a word into its characters and looks up each one with the reading it has in the
    /// word. Punctuation is skipped, characters which are not in the lexicon (e.g. "Ｕ" in
    /// "ＵＳＢ手指") are returned without definition.
    pub fn component_characters(&self, entry: &Entry) -> Result<Vec<Component>, SqliteError> {
        let pinyins = split_list(&entry.component_pinyin);
        let tones = split_list(&entry.tone_nums);
        let mut components: Vec<Component> = vec![];
        for c in entry.traditional.chars() {
            let character = c.to_string();
            if is_punctuation(&character) {
                continue;
            }
            let idx = components.len();
            if idx >= tones.len() {
                warn!(
                    word = %entry.traditional,
                    tone_nums = %entry.tone_nums,
                    "more characters than syllables"
                );
                break;
            }
            let mut component = Component {
                traditional: character.clone(),
                simplified: String::new(),
                pinyin: String::new(),
                tone_nums: pinyin::NEUTRAL_TONE.to_string(),
                english: String::new(),
            };
            if is_hanzi(&character) {
                component.pinyin = pinyins.get(idx).copied().unwrap_or_default().to_owned();
                component.tone_nums = tones[idx].to_owned();
                let mut stmt = self.conn.prepare_cached(SELECT_TRADITIONAL)?;
                let mut rows = stmt.query((&character,))?;
                while let Some(row) = rows.next()? {
                    let candidate = entry_from_row(row)?;
                    let is_match = is_reasonable_match(&candidate, &component.pinyin);
                    component.simplified = candidate.simplified;
                    component.english = candidate.english;
                    if is_match {
                        break;
                    }
                }
            }
            if component.simplified.is_empty() {
                component.simplified = character;
            }
            components.push(component);
        }
        Ok(components)
    }
}

fn compact_query(search: &str) -> String {
    search.to_lowercase().replace(' ', "")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cedict_to_db::CedictToDb;

    const DICT: &str = "\
的 的 [de5] /of/
中國 中国 [Zhong1 guo2] /China/
中 中 [zhong1] /within/among/
中 中 [zhong4] /to hit (the mark)/
國 国 [guo2] /country/nation/state/
單 单 [Shan4] /surname Shan/
單 单 [dan1] /bill/list/form/single/CL:張|张[zhang1],份[fen4]/
單張 单张 [dan1 zhang1] /leaflet/
張 张 [Zhang1] /surname Zhang/
張 张 [zhang1] /to open up/classifier for flat objects, sheet/CL:個|个[ge4]/
個 个 [ge4] /individual/this/that/size/classifier for people or objects in general/
醫生 医生 [yi1 sheng1] /doctor/CL:個|个[ge4],位[wei4],名[ming2]/
綠 绿 [lu:4] /green/
一點 一点 [yi1 dian3] /a bit/see 一點兒|一点儿[yi1 dian3 r5]/
伊隆·馬斯克 伊隆·马斯克 [Yi1 long2 · Ma3 si1 ke4] /Elon Musk/
";

    fn lexicon_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        let mut cedict_to_db = CedictToDb::new(&conn).unwrap();
        cedict_to_db.load_ranks(["1 100 的", "2 50 中国", "3 40 中"].map(str::to_owned));
        cedict_to_db
            .cedict_to_db(DICT.lines().map(str::to_owned))
            .unwrap();
        conn
    }

    fn words(rows: &[LexiconRow]) -> Vec<&str> {
        rows.iter().map(|r| r.entry.traditional.as_str()).collect()
    }

    fn id_of(lexicon: &Lexicon, word: &str) -> SqliteId {
        lexicon.search_chinese(word).unwrap()[0].id
    }

    #[test]
    fn test_insert_and_get() {
        let conn = Connection::open_in_memory().unwrap();
        let lexicon = Lexicon::new(&conn);
        lexicon.create_tables().unwrap();
        let entry = Entry {
            traditional: "你好".to_owned(),
            simplified: "你好".to_owned(),
            pinyin: "nǐ hǎo".to_owned(),
            pinyin_tonemarked: "nǐhǎo".to_owned(),
            pinyin_toneless: "nihao".to_owned(),
            english: "hello/hi".to_owned(),
            also_written: String::new(),
            also_pronounced: String::new(),
            classifiers: String::new(),
            tone_nums: "3,3".to_owned(),
            component_pinyin: "nǐ,hǎo".to_owned(),
            rank: config::UNRANKED,
        };
        let id = lexicon.insert(&entry).unwrap();
        assert_eq!(lexicon.get(id).unwrap(), Some(LexiconRow { id, entry }));
        assert_eq!(lexicon.get(id + 1).unwrap(), None);
        assert_eq!(lexicon.count().unwrap(), 1);
    }

    #[test]
    fn test_search_hanzi() {
        let conn = lexicon_conn();
        let lexicon = Lexicon::new(&conn);
        assert_eq!(words(&lexicon.search_chinese("中国").unwrap()), vec!["中國"]);
        assert_eq!(words(&lexicon.search_chinese("中國").unwrap()), vec!["中國"]);
        // prefix match, best rank first
        let rows = lexicon.search_chinese("中").unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].entry.traditional, "中國");
        assert_eq!(rows[0].entry.rank, 2);
        assert_eq!(rows[1].entry.rank, 3);
        assert!(lexicon.search_chinese("").unwrap().is_empty());
        assert!(lexicon.search_chinese("貓").unwrap().is_empty());
    }

    #[test]
    fn test_search_pinyin() {
        let conn = lexicon_conn();
        let lexicon = Lexicon::new(&conn);
        for query in ["zhong1 guo2", "Zhong1guo2", "zhōngguó", "zhōng guó", "zhong guo", "ZhongGuo"] {
            assert_eq!(words(&lexicon.search_chinese(query).unwrap()), vec!["中國"], "{query}");
        }
        assert_eq!(words(&lexicon.search_chinese("lu:4").unwrap()), vec!["綠"]);
        assert_eq!(words(&lexicon.search_chinese("lv4").unwrap()), vec!["綠"]);
        // a plain ü is not a tone mark, the toneless search treats it as u
        assert_eq!(words(&lexicon.search_chinese("lü").unwrap()), vec!["綠"]);
        assert_eq!(words(&lexicon.search_chinese("lu").unwrap()), vec!["綠"]);
        assert_eq!(lexicon.search_chinese("zhong").unwrap().len(), 2);
    }

    #[test]
    fn test_search_classifier() {
        let conn = lexicon_conn();
        let lexicon = Lexicon::new(&conn);
        let rows = lexicon.search_chinese("CL:個").unwrap();
        let mut found = words(&rows);
        found.sort_unstable();
        assert_eq!(found, vec!["張", "醫生"]);
    }

    #[test]
    fn test_search_english() {
        let conn = lexicon_conn();
        let lexicon = Lexicon::new(&conn);
        assert_eq!(words(&lexicon.search_english("China").unwrap()), vec!["中國"]);
        assert_eq!(words(&lexicon.search_english("of").unwrap()), vec!["的"]);
        assert_eq!(lexicon.search_english("surname").unwrap().len(), 2);
        assert!(lexicon.search_english("").unwrap().is_empty());
    }

    #[test]
    fn test_details() {
        let conn = lexicon_conn();
        let lexicon = Lexicon::new(&conn);
        let id = id_of(&lexicon, "医生");
        let details = lexicon.details(id).unwrap().unwrap();
        assert_eq!(details.id, id);
        assert_eq!(details.entry.simplified, "医生");
        assert_eq!(
            details.definitions,
            vec![Definition {
                english: "doctor".to_owned(),
                inline_chinese: vec![],
            }]
        );
        // 位 and 名 are not in the lexicon
        assert_eq!(
            details.classifiers,
            vec![ClassifierInfo {
                traditional: "個".to_owned(),
                simplified: "个".to_owned(),
                pinyin: "gè".to_owned(),
                tone_nums: "4".to_owned(),
                english: "classifier for people or objects in general".to_owned(),
            }]
        );
        assert_eq!(details.components.len(), 2);
        assert_eq!(details.components[0].traditional, "醫");
        assert_eq!(details.components[0].simplified, "醫");
        assert_eq!(details.components[0].pinyin, "yī");
        assert_eq!(details.components[0].english, "");
        assert_eq!(details.components[1].tone_nums, "1");

        assert_eq!(lexicon.details(10_000).unwrap(), None);
    }

    #[test]
    fn test_details_inline_chinese() {
        let conn = lexicon_conn();
        let lexicon = Lexicon::new(&conn);
        let details = lexicon.details(id_of(&lexicon, "一点")).unwrap().unwrap();
        assert_eq!(details.definitions.len(), 2);
        assert_eq!(details.definitions[1].english, "see 一點兒|一点儿 yī diǎnr");
        assert_eq!(details.definitions[1].inline_chinese, vec!["一點兒|一点儿"]);
    }

    #[test]
    fn test_classifier_info() {
        let conn = lexicon_conn();
        let lexicon = Lexicon::new(&conn);
        let info = lexicon.classifier_info("張").unwrap().unwrap();
        assert_eq!(info.simplified, "张");
        assert_eq!(info.pinyin, "zhāng");
        assert_eq!(info.english, "classifier for flat objects, sheet");
        assert_eq!(lexicon.classifier_info("份").unwrap(), None);
    }

    #[test]
    fn test_components_skip_surnames() {
        let conn = lexicon_conn();
        let lexicon = Lexicon::new(&conn);
        let details = lexicon.details(id_of(&lexicon, "单张")).unwrap().unwrap();
        let english: Vec<&str> = details.components.iter().map(|c| c.english.as_str()).collect();
        assert_eq!(
            english,
            vec!["bill/list/form/single", "to open up/classifier for flat objects, sheet"]
        );
        assert_eq!(details.components[1].simplified, "张");

        let details = lexicon.details(id_of(&lexicon, "中国")).unwrap().unwrap();
        assert_eq!(details.components[0].english, "within/among");
        assert_eq!(details.components[1].simplified, "国");
    }

    #[test]
    fn test_components_skip_punctuation() {
        let conn = lexicon_conn();
        let lexicon = Lexicon::new(&conn);
        let row = &lexicon.search_chinese("伊隆").unwrap()[0];
        let components = lexicon.component_characters(&row.entry).unwrap();
        let chars: Vec<&str> = components.iter().map(|c| c.traditional.as_str()).collect();
        assert_eq!(chars, vec!["伊", "隆", "馬", "斯", "克"]);
        assert_eq!(components[2].pinyin, "mǎ");
        assert_eq!(components[2].tone_nums, "3");
    }

    #[test]
    fn test_is_reasonable_match() {
        let conn = lexicon_conn();
        let lexicon = Lexicon::new(&conn);
        let rows = lexicon.search_column(Column::Traditional, "單", None).unwrap();
        let surname = rows.iter().find(|r| r.entry.pinyin == "Shàn").unwrap();
        assert!(!is_reasonable_match(&surname.entry, "shàn"));
        let bill = rows.iter().find(|r| r.entry.pinyin == "dān").unwrap();
        assert!(is_reasonable_match(&bill.entry, "dān"));
        assert!(is_reasonable_match(&bill.entry, "dan"));
        assert!(!is_reasonable_match(&bill.entry, "dàn"));

        // the display pinyin keeps capitals, a capitalised reading does not match
        let place = Entry {
            pinyin: "Dān".to_owned(),
            english: "Dan county".to_owned(),
            ..bill.entry.clone()
        };
        assert!(!is_reasonable_match(&place, "dān"));
        assert!(is_reasonable_match(&place, "Dān"));
    }

    #[test]
    fn test_search_invalid_match_syntax() {
        let conn = lexicon_conn();
        let lexicon = Lexicon::new(&conn);
        assert!(lexicon.search_english("AND").unwrap().is_empty());
        assert!(lexicon.search_english("\"").unwrap().is_empty());
        assert!(lexicon.search_chinese("中\"").unwrap().is_empty());
        // valid queries still work afterwards
        assert_eq!(words(&lexicon.search_english("China").unwrap()), vec!["中國"]);
    }

    #[test]
    fn test_search_column_limit() {
        let conn = lexicon_conn();
        let lexicon = Lexicon::new(&conn);
        assert_eq!(lexicon.search_column(Column::Simplified, "中*", Some(1)).unwrap().len(), 1);
        assert_eq!(lexicon.search_column(Column::Simplified, "中*", None).unwrap().len(), 3);
    }
}
