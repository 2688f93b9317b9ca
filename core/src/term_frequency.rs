use crate::error::Result;
use crate::record::{CompositeKey, WeightedEntry, WordCount};
use crate::runtime::Reducer;

/// `1 + log10(raw_count)` for a positive count, `0` otherwise.
pub fn weighted_tf(raw_count: i64) -> f64 {
    if raw_count > 0 {
        1.0 + (raw_count as f64).log10()
    } else {
        0.0
    }
}

/// Sum of the positive counts only; anything else contributes nothing.
// TODO: counts are always 1 today, decide whether non-positive counts should be an error instead
pub fn positive_sum(counts: &[i64]) -> i64 {
    counts.iter().filter(|count| **count > 0).sum()
}

/// Plain occurrence count per `(word, document)`.
pub struct DocWordCountReducer;

impl Reducer for DocWordCountReducer {
    type Key = CompositeKey;
    type Value = i64;
    type Output = WordCount;

    fn reduce(&self, key: CompositeKey, counts: Vec<i64>, out: &mut Vec<WordCount>) -> Result<()> {
        out.push(WordCount::new(key, counts.iter().sum()));
        Ok(())
    }
}

/// Log-dampened term frequency per `(word, document)`.
pub struct TermFrequencyReducer;

impl Reducer for TermFrequencyReducer {
    type Key = CompositeKey;
    type Value = i64;
    type Output = WeightedEntry;

    fn reduce(&self, key: CompositeKey, counts: Vec<i64>, out: &mut Vec<WeightedEntry>) -> Result<()> {
        out.push(WeightedEntry::new(key, weighted_tf(positive_sum(&counts))));
        Ok(())
    }
}
