//! Word-frequency analysis for novels, PDF documents, pasted text and web pages.
//!
//! Text is acquired from an [`source::InputSource`], cleaned by
//! [`algo::tokenizer`], counted and ranked by [`algo::frequency`], mined for
//! keywords by [`algo::keywords`], and exported through [`algo::export`].
//! [`session::Session`] ties the steps together for interactive surfaces.

pub mod algo;
pub mod config;
pub mod error;
pub mod ops;
pub mod render;
pub mod session;
pub mod source;

#[cfg(feature = "mcp")]
pub mod mcp;

pub use config::AnalyzerConfig;
pub use error::{Result, WordFreqError};
