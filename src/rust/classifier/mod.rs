use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

mod classifier;
mod error;
mod estimator;
mod model;
mod pipeline;
mod utils;
mod vectorizer;

pub use classifier::ClassifierHandle;
pub use error::ClassifierError;
pub use model::{PipelineStep, TextClassifier};
pub use pipeline::{TextPipeline, PREPROCESS_FUNCTION};
pub use vectorizer::{Norm, TfidfVectorizer};

/// Sentiment label attached to an analysis.
///
/// Live inference only ever yields `Positive` or `Negative`; `Neutral` marks a
/// fallback result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl SentimentLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
            Self::Neutral => "neutral",
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SentimentLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "positive" => Ok(Self::Positive),
            "negative" => Ok(Self::Negative),
            "neutral" => Ok(Self::Neutral),
            other => Err(format!("Unknown sentiment label: {}", other)),
        }
    }
}
