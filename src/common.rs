use crate::config;

pub type SqliteId = i64;

pub fn format_word(trad: &str, simp: &str) -> String {
    if trad == simp {
        trad.to_owned()
    } else {
        format!("{}{}{}", trad, config::WORD_SEP, simp)
    }
}

/// Splits a comma separated list field, an empty field is an empty list.
pub fn split_list(list: &str) -> Vec<&str> {
    if list.is_empty() {
        vec![]
    } else {
        list.split(config::LIST_SEP).collect()
    }
}
