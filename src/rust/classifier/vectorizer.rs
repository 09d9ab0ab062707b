use std::collections::HashMap;

use lazy_static::lazy_static;
use ndarray::Array1;
use regex::Regex;
use serde::Deserialize;

use super::error::ClassifierError;
use super::utils::{l1_normalize_vector, normalize_vector};
use crate::preprocessing::WORD_CLASS;

lazy_static! {
    // Maximal runs of two or more word characters, the default token pattern
    // of the vectorizer the artifact was fit with.
    static ref TOKEN: Regex =
        Regex::new(&format!(r"[{}]{{2,}}", WORD_CLASS)).expect("static pattern is valid");
}

/// Longest n-gram an artifact may ask for.
pub const MAX_NGRAM: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Norm {
    L1,
    L2,
}

fn default_norm() -> Option<Norm> {
    Some(Norm::L2)
}

fn default_ngram_range() -> (usize, usize) {
    (1, 1)
}

fn default_true() -> bool {
    true
}

/// Fitted TF-IDF vectorizer: a term vocabulary plus per-term idf weights.
#[derive(Debug, Clone, Deserialize)]
pub struct TfidfVectorizer {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
    #[serde(default = "default_ngram_range")]
    ngram_range: (usize, usize),
    #[serde(default)]
    sublinear_tf: bool,
    #[serde(default = "default_norm")]
    norm: Option<Norm>,
    #[serde(default = "default_true")]
    lowercase: bool,
}

impl TfidfVectorizer {
    /// Number of features produced by `transform`.
    pub fn n_features(&self) -> usize {
        self.idf.len()
    }

    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.idf.is_empty() {
            return Err("TfidfVectorizer has an empty idf vector".into());
        }
        let (min_n, max_n) = self.ngram_range;
        if min_n == 0 || min_n > max_n || max_n > MAX_NGRAM {
            return Err(format!(
                "Invalid ngram_range ({}, {}); expected 1 <= min <= max <= {}",
                min_n, max_n, MAX_NGRAM
            ));
        }
        if let Some((term, &index)) = self.vocabulary.iter().find(|(_, &i)| i >= self.idf.len()) {
            return Err(format!(
                "Vocabulary term {:?} maps to index {} but only {} idf weights are present",
                term,
                index,
                self.idf.len()
            ));
        }
        if self.idf.iter().any(|w| !w.is_finite()) {
            return Err("TfidfVectorizer idf contains non-finite weights".into());
        }
        Ok(())
    }

    /// Converts already-preprocessed text into a weighted, normalized feature vector.
    pub fn transform(&self, text: &str) -> Result<Array1<f64>, ClassifierError> {
        let text = if self.lowercase {
            text.to_lowercase()
        } else {
            text.to_string()
        };
        let tokens: Vec<&str> = TOKEN.find_iter(&text).map(|m| m.as_str()).collect();

        let mut counts = Array1::<f64>::zeros(self.n_features());
        let (min_n, max_n) = self.ngram_range;
        for n in min_n..=max_n.min(tokens.len()) {
            for window in tokens.windows(n) {
                let gram = window.join(" ");
                if let Some(&index) = self.vocabulary.get(&gram) {
                    let slot = counts.get_mut(index).ok_or_else(|| {
                        ClassifierError::InferenceFailure(format!(
                            "Feature index {} out of range for {} features",
                            index,
                            self.n_features()
                        ))
                    })?;
                    *slot += 1.0;
                }
            }
        }

        if self.sublinear_tf {
            counts.mapv_inplace(|tf| if tf > 0.0 { 1.0 + tf.ln() } else { 0.0 });
        }
        let weighted = counts * &Array1::from(self.idf.clone());

        Ok(match self.norm {
            Some(Norm::L2) => normalize_vector(&weighted),
            Some(Norm::L1) => l1_normalize_vector(&weighted),
            None => weighted,
        })
    }
}
