pub mod cache;
pub mod export;
pub mod frequency;
pub mod keywords;
pub mod tokenizer;
pub mod url_normalize;

#[cfg(feature = "cache")]
pub mod storage;
