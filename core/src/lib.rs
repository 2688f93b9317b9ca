//! Per-document term statistics over a corpus of text files.
//!
//! Two pipelines run on a small grouped-aggregation runtime ([`runtime`]):
//!
//! - indexing: tokenize and count, weight term frequencies, then score TF-IDF
//!   against the corpus-wide document frequency;
//! - search: sum the TF-IDF scores of every line matching a query word, per document.
//!
//! Stages talk to each other through `word#####document\tvalue` text files ([`record`]).

pub mod error;
pub mod persist;
pub mod pipeline;
pub mod record;
pub mod runtime;
pub mod search;
pub mod term_frequency;
pub mod tfidf;
pub mod tokenizer;

pub use error::{Error, Result};
pub use persist::Stage;
pub use pipeline::{IndexReport, Pipeline, PipelineConfig, SearchReport};
pub use record::{CompositeKey, Record, SearchResult, WeightedEntry, WordCount};
pub use search::QuerySet;
pub use tfidf::CorpusSize;
