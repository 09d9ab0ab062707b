//! Text normalization applied before inference.
//!
//! The classifier artifact was fit on text passed through exactly this
//! transform, so the punctuation rule and the stop-word list are frozen:
//! changing either silently shifts every prediction.

use std::collections::HashSet;

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

use crate::classifier::ClassifierError;

/// The English stop-word list the training pipeline used (NLTK `english`, 179 words).
pub const ENGLISH_STOP_WORDS: [&str; 179] = [
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "you're",
    "you've", "you'll", "you'd", "your", "yours", "yourself", "yourselves", "he", "him", "his",
    "himself", "she", "she's", "her", "hers", "herself", "it", "it's", "its", "itself",
    "they", "them", "their", "theirs", "themselves", "what", "which", "who", "whom", "this",
    "that", "that'll", "these", "those", "am", "is", "are", "was", "were", "be",
    "been", "being", "have", "has", "had", "having", "do", "does", "did", "doing",
    "a", "an", "the", "and", "but", "if", "or", "because", "as", "until",
    "while", "of", "at", "by", "for", "with", "about", "against", "between", "into",
    "through", "during", "before", "after", "above", "below", "to", "from", "up", "down",
    "in", "out", "on", "off", "over", "under", "again", "further", "then", "once",
    "here", "there", "when", "where", "why", "how", "all", "any", "both", "each",
    "few", "more", "most", "other", "some", "such", "no", "nor", "not", "only",
    "own", "same", "so", "than", "too", "very", "s", "t", "can", "will",
    "just", "don", "don't", "should", "should've", "now", "d", "ll", "m", "o",
    "re", "ve", "y", "ain", "aren", "aren't", "couldn", "couldn't", "didn", "didn't",
    "doesn", "doesn't", "hadn", "hadn't", "hasn", "hasn't", "haven", "haven't", "isn", "isn't",
    "ma", "mightn", "mightn't", "mustn", "mustn't", "needn", "needn't", "shan", "shan't", "shouldn",
    "shouldn't", "wasn", "wasn't", "weren", "weren't", "won", "won't", "wouldn", "wouldn't",
];

/// Word characters as the training transform's regex engine defines them:
/// letters and numbers of every script, plus `_`.
///
/// This is narrower than the `regex` crate's `\w`, which also accepts
/// combining marks, connector punctuation and join controls, and does not
/// accept `No`/`Nl` numerics such as `²` or `½`.
pub(crate) const WORD_CLASS: &str = r"\p{L}\p{N}_";

lazy_static! {
    static ref NON_WORD: Regex = Regex::new(&format!(r"[^{}\s\x{{1C}}-\x{{1F}}]", WORD_CLASS))
        .expect("static pattern is valid");
    static ref STOP_WORDS: HashSet<&'static str> = ENGLISH_STOP_WORDS.iter().copied().collect();
}

/// Whitespace as the training transform splits on it: Unicode `White_Space`
/// plus the information separators U+001C..=U+001F.
pub fn is_separator(c: char) -> bool {
    c.is_whitespace() || ('\u{1c}'..='\u{1f}').contains(&c)
}

/// Returns true if `token` is in the frozen stop-word list.
pub fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.contains(token)
}

/// Normalizes a single text: lowercase, strip punctuation, drop stop words,
/// and rejoin the surviving tokens with single spaces.
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let stripped = NON_WORD.replace_all(&lowered, "");
    stripped
        .split(is_separator)
        .filter(|token| !token.is_empty() && !is_stop_word(token))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalizes every text in order.
pub fn normalize_batch<S: AsRef<str>>(texts: &[S]) -> Vec<String> {
    texts.iter().map(|text| normalize(text.as_ref())).collect()
}

/// Normalizes a dynamically typed input.
///
/// Accepts a JSON string or an array of strings and returns a value of the
/// same shape. Anything else fails with `UnsupportedInputType`.
pub fn normalize_value(input: &Value) -> Result<Value, ClassifierError> {
    match input {
        Value::String(text) => Ok(Value::String(normalize(text))),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(text) => Ok(Value::String(normalize(text))),
                other => Err(ClassifierError::UnsupportedInputType(format!(
                    "sequence containing {}",
                    type_name(other)
                ))),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        other => Err(ClassifierError::UnsupportedInputType(type_name(other).to_string())),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
