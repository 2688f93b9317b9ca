//! TF-IDF composition.
//!
//! The term-frequency output is re-keyed by word alone so that one reduce call sees
//! every document containing that word. Its document frequency then gives the IDF:
//!
//! ```text
//! idf(t)       = log10(1 + corpus_size / df(t))     integer division
//! tfidf(t, d)  = weighted_tf(t, d) * idf(t)
//! ```
//!
//! The quotient truncates before the logarithm. With 10 documents and a df of 3
//! the IDF is `log10(4)`, not `log10(4.333..)`.

use crate::error::{Error, Result};
use crate::record::{CompositeKey, WeightedEntry};
use crate::runtime::{Emitter, InputSplit, Mapper, Reducer};
use std::collections::BTreeMap;

/// Number of source documents in an indexing run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorpusSize(u64);

impl CorpusSize {
    pub fn new(documents: u64) -> Self {
        Self(documents)
    }

    /// Count the same splits the tokenizer consumes.
    pub fn of_splits(splits: &[InputSplit]) -> Self {
        Self(splits.len() as u64)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

/// `None` when no document contains the word.
pub fn idf(corpus_size: CorpusSize, documents_with_word: u64) -> Option<f64> {
    if documents_with_word == 0 {
        return None;
    }
    let ratio = corpus_size.get() / documents_with_word;
    Some(((1 + ratio) as f64).log10())
}

/// One document's term frequency, keyed by word during the shuffle.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentTf {
    pub document: String,
    pub tf: f64,
}

/// Reads `word#####document\ttf` lines and regroups them by word.
pub struct TermEntryMapper;

impl Mapper for TermEntryMapper {
    type Key = String;
    type Value = DocumentTf;

    fn map(&self, line: &str, _split: &InputSplit, out: &mut Emitter<String, DocumentTf>) -> Result<()> {
        let entry = WeightedEntry::decode(line)?;
        let CompositeKey { word, document } = entry.key;
        out.emit(word, DocumentTf { document, tf: entry.value });
        Ok(())
    }
}

pub struct TfIdfReducer {
    corpus_size: CorpusSize,
}

impl TfIdfReducer {
    /// Refuses an empty corpus up front; every IDF would be meaningless.
    pub fn new(corpus_size: CorpusSize) -> Result<Self> {
        if corpus_size.get() == 0 {
            return Err(Error::InvalidCorpusSize(corpus_size.get()));
        }
        Ok(Self { corpus_size })
    }
}

impl Reducer for TfIdfReducer {
    type Key = String;
    type Value = DocumentTf;
    type Output = WeightedEntry;

    fn reduce(&self, word: String, values: Vec<DocumentTf>, out: &mut Vec<WeightedEntry>) -> Result<()> {
        // Scoped to this word; nothing survives into the next group.
        let mut accumulator: BTreeMap<String, f64> = BTreeMap::new();
        let mut documents_with_word: u64 = 0;
        for DocumentTf { document, tf } in values {
            documents_with_word += 1;
            accumulator.insert(document, tf);
        }

        let idf = idf(self.corpus_size, documents_with_word)
            .ok_or_else(|| Error::DivisionByZero { word: word.clone() })?;

        for (document, tf) in accumulator {
            out.push(WeightedEntry::new(CompositeKey::new(word.as_str(), document), tf * idf));
        }
        Ok(())
    }
}
