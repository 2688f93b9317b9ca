use crate::error::{Error, Result};
use crate::record::{SearchResult, WeightedEntry};
use crate::runtime::{Emitter, InputSplit, Mapper, Reducer};

/// Query words for one search run. Duplicates are kept: a repeated word matches the
/// same lines again and adds their scores a second time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySet {
    words: Vec<String>,
}

impl QuerySet {
    /// Split every argument on whitespace. Empty words are dropped since an empty
    /// needle would match every line.
    pub fn parse<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words: Vec<String> = args
            .into_iter()
            .flat_map(|arg| arg.as_ref().split_whitespace().map(str::to_string).collect::<Vec<_>>())
            .collect();
        if words.is_empty() {
            return Err(Error::EmptyQuery);
        }
        Ok(Self { words })
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }
}

/// Matches query words against raw TF-IDF lines.
///
/// The test is a case-sensitive substring check on the whole encoded line, so `cat`
/// also hits `category#####...` and any document whose name contains `cat`. Every
/// matching word emits the line's score again; the reducer adds them all up.
pub struct SearchMapper {
    queries: QuerySet,
}

impl SearchMapper {
    pub fn new(queries: QuerySet) -> Self {
        Self { queries }
    }
}

impl Mapper for SearchMapper {
    type Key = String;
    type Value = f64;

    fn map(&self, line: &str, _split: &InputSplit, out: &mut Emitter<String, f64>) -> Result<()> {
        let matches = self.queries.words().iter().filter(|query| line.contains(query.as_str())).count();
        if matches == 0 {
            return Ok(());
        }
        let entry = WeightedEntry::decode(line)?;
        for _ in 0..matches {
            out.emit(entry.key.document.clone(), entry.value);
        }
        Ok(())
    }
}

/// Sums every contribution per document.
pub struct SearchReducer;

impl Reducer for SearchReducer {
    type Key = String;
    type Value = f64;
    type Output = SearchResult;

    fn reduce(&self, document: String, scores: Vec<f64>, out: &mut Vec<SearchResult>) -> Result<()> {
        out.push(SearchResult { document, score: scores.iter().sum() });
        Ok(())
    }
}

/// Highest score first; ties by document name.
pub fn rank(mut results: Vec<SearchResult>) -> Vec<SearchResult> {
    results.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.document.cmp(&b.document)));
    results
}
