pub mod cedict_parser;
pub mod cedict_to_db;
pub mod common;
pub mod config;
pub mod db_check;
pub mod lexicon;
pub mod pinyin;
pub mod text_format;
