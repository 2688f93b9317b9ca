//! Line codec shared by every stage.
//!
//! A record travels between stages as `word#####document\tvalue`. Internally the
//! key is a typed [`CompositeKey`]; the delimited form only exists at the stage
//! boundary, where [`Record`]'s `Display` writes it and [`Record::decode`] reads it.

use crate::error::{Error, Result};
use std::fmt;

/// Separates the word from the document id inside an encoded key.
pub const KEY_DELIMITER: &str = "#####";
/// Separates the encoded key from its value.
pub const VALUE_DELIMITER: char = '\t';

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CompositeKey {
    pub word: String,
    pub document: String,
}

impl CompositeKey {
    pub fn new(word: impl Into<String>, document: impl Into<String>) -> Self {
        Self { word: word.into(), document: document.into() }
    }

    pub fn encode(&self) -> String {
        self.to_string()
    }

    /// Split on the first delimiter. A key without one cannot be recovered.
    pub fn decode(encoded: &str) -> Result<Self> {
        let (word, document) = encoded
            .split_once(KEY_DELIMITER)
            .ok_or_else(|| Error::malformed(encoded, "missing key delimiter"))?;
        Ok(Self::new(word, document))
    }
}

impl fmt::Display for CompositeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.word, KEY_DELIMITER, self.document)
    }
}

/// A value that can sit on the right-hand side of a record line.
pub trait RecordValue: Sized {
    fn render(&self) -> String;
    fn parse(raw: &str) -> Option<Self>;
}

impl RecordValue for i64 {
    fn render(&self) -> String {
        self.to_string()
    }

    fn parse(raw: &str) -> Option<Self> {
        raw.parse().ok()
    }
}

impl RecordValue for f64 {
    fn render(&self) -> String {
        render_double(*self)
    }

    fn parse(raw: &str) -> Option<Self> {
        raw.parse().ok()
    }
}

/// Render a double the way the JVM prints one, so files stay byte-compatible with
/// JVM-produced record files: plain notation with at least one fractional
/// digit inside `[1e-3, 1e7)`, `1.0E-4` style notation outside it.
///
/// Both branches use the shortest digits that round-trip, so parsing the text back
/// yields the same bits.
pub fn render_double(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0.0" } else { "0.0" }.to_string();
    }

    if (1e-3..1e7).contains(&value.abs()) {
        let plain = value.to_string();
        return if plain.contains('.') { plain } else { format!("{plain}.0") };
    }

    let scientific = format!("{value:e}");
    match scientific.split_once('e') {
        Some((mantissa, exponent)) if mantissa.contains('.') => format!("{mantissa}E{exponent}"),
        Some((mantissa, exponent)) => format!("{mantissa}.0E{exponent}"),
        None => scientific,
    }
}

/// One emitted `(CompositeKey, value)` pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Record<V> {
    pub key: CompositeKey,
    pub value: V,
}

/// Term frequency or TF-IDF score attached to a key.
pub type WeightedEntry = Record<f64>;
/// Raw occurrence count of a word in a document.
pub type WordCount = Record<i64>;

impl<V: RecordValue> Record<V> {
    pub fn new(key: CompositeKey, value: V) -> Self {
        Self { key, value }
    }

    /// Parse `word#####document\tvalue`.
    ///
    /// A bad line is an error for the whole task: dropping it would silently skew
    /// every score computed downstream.
    pub fn decode(line: &str) -> Result<Self> {
        let (key, value) = line
            .split_once(VALUE_DELIMITER)
            .ok_or_else(|| Error::malformed(line, "missing value delimiter"))?;
        let key = CompositeKey::decode(key.trim_end()).map_err(|_| Error::malformed(line, "missing key delimiter"))?;
        let value = V::parse(value.trim()).ok_or_else(|| Error::malformed(line, "unparsable value"))?;
        Ok(Self { key, value })
    }
}

impl<V: RecordValue> fmt::Display for Record<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.key, VALUE_DELIMITER, self.value.render())
    }
}

/// Final search output: a document and the summed TF-IDF of every matching line.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub document: String,
    pub score: f64,
}

impl SearchResult {
    pub fn decode(line: &str) -> Result<Self> {
        let (document, score) = line
            .split_once(VALUE_DELIMITER)
            .ok_or_else(|| Error::malformed(line, "missing value delimiter"))?;
        let score = f64::parse(score.trim()).ok_or_else(|| Error::malformed(line, "unparsable value"))?;
        Ok(Self { document: document.to_string(), score })
    }
}

impl fmt::Display for SearchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.document, VALUE_DELIMITER, self.score.render())
    }
}
