use crate::error::Result;
use crate::record::CompositeKey;
use crate::runtime::{Emitter, InputSplit, Mapper};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Splits at every word/non-word transition, absorbing the whitespace around it.
    static ref WORD_BOUNDARY: Regex = Regex::new(r"\s*\b\s*").expect("valid regex");
}

/// Tokenize a line: lowercase it, split on word boundaries and drop empty pieces.
///
/// Runs of punctuation between words survive as their own tokens. Whitespace is only
/// swallowed where it touches a word boundary, so `"  - item"` keeps `"  -"` whole
/// and a line of bare spaces is a single token. No stemming or stop-word removal.
pub fn tokenize(line: &str) -> Vec<String> {
    let lowered = line.to_lowercase();
    WORD_BOUNDARY
        .split(&lowered)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Emits `(word#####document, 1)` for every token of a line. Feeds both the
/// word-count and the term-frequency jobs.
pub struct TokenCountMapper;

impl Mapper for TokenCountMapper {
    type Key = CompositeKey;
    type Value = i64;

    fn map(&self, line: &str, split: &InputSplit, out: &mut Emitter<CompositeKey, i64>) -> Result<()> {
        for token in tokenize(line) {
            out.emit(CompositeKey::new(token, split.document_id.as_str()), 1);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_tokenize() {
        assert_eq!(tokenize("The cat sat"), vec!["the", "cat", "sat"]);
    }

    #[test]
    fn punctuation_is_its_own_token() {
        assert_eq!(tokenize("hello, world"), vec!["hello", ",", "world"]);
    }

    #[test]
    fn mapper_keys_tokens_by_document() {
        let split = InputSplit::new("corpus/file1.txt");
        let mut out = Emitter::new();
        TokenCountMapper.map("Hadoop is hadoop", &split, &mut out).unwrap();
        let records = out.into_records();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0], (CompositeKey::new("hadoop", "file1.txt"), 1));
        assert_eq!(records[2], (CompositeKey::new("hadoop", "file1.txt"), 1));
    }

    #[test]
    fn empty_line_yields_nothing() {
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn whitespace_away_from_word_boundaries_is_kept() {
        assert_eq!(tokenize("  - item"), vec!["  -", "item"]);
        assert_eq!(tokenize("note)  "), vec!["note", ")  "]);
        assert_eq!(tokenize("   "), vec!["   "]);
    }
}
