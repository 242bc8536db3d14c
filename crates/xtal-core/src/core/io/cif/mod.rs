//! Crystallographic Information File (CIF / mmCIF) support.
//!
//! ## Overview
//!
//! CIF text is read line by line by a small state machine ([`parser::CifParser`]).
//! Each `data_` statement opens a [`block::CifBlock`]; inside a block, single
//! data items become scalars and `loop_` constructs become column tables.
//! Tags are stored trimmed and lower-cased, so lookups are case-insensitive.
//!
//! ## Architecture
//!
//! - [`value`] - typed tokens and numeric coercion
//! - [`tokenizer`] - statement classification and value splitting for one line
//! - [`block`] - the block data model, record views and CIF serialization
//! - [`parser`] - the incremental line-driven state machine
//! - [`reader`] - a collection of parsed blocks with chunked or whole-file input

pub mod block;
pub mod parser;
pub mod reader;
pub mod tokenizer;
pub mod value;

pub use block::{CifBlock, CifLoop, CifRecord};
pub use parser::{BlockSink, CifParser};
pub use reader::CifReader;
pub use value::CifValue;

use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CifError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Line {line}: data item '{tag}' appears before any data_ block")]
    NoBlock { line: usize, tag: String },
    #[error("Line {line}: data item '{tag}' has no value")]
    MissingValue { line: usize, tag: String },
    #[error("Line {line}: loop_ declares no columns")]
    EmptyLoop { line: usize },
    #[error("Line {line}: text field is never closed by a ';' line")]
    UnterminatedTextField { line: usize },
    #[error(
        "Line {line}: loop over {columns} columns ends with a partial row of {values} values"
    )]
    RaggedLoop {
        line: usize,
        columns: usize,
        values: usize,
    },
    #[error("Loop row has {found} values but the loop declares {expected} columns")]
    LoopLengthMismatch { expected: usize, found: usize },
}

/// Canonical form of a tag or block name: trimmed and lower-cased.
pub(crate) fn canonical(key: &str) -> String {
    key.trim().to_lowercase()
}
