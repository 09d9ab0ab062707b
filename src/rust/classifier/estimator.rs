use ndarray::{Array1, Array2};
use serde::Deserialize;

use super::utils::{sigmoid, softmax_pair};

/// Binary logistic regression over a dense feature vector.
#[derive(Debug, Clone, Deserialize)]
pub struct LogisticRegression {
    pub(crate) classes: Vec<String>,
    coef: Vec<f64>,
    #[serde(default)]
    intercept: f64,
}

/// Multinomial naive Bayes with two classes.
#[derive(Debug, Clone, Deserialize)]
pub struct MultinomialNb {
    pub(crate) classes: Vec<String>,
    class_log_prior: Vec<f64>,
    feature_log_prob: Vec<Vec<f64>>,
}

/// The final stage of a pipeline: maps features to class probabilities.
#[derive(Debug, Clone)]
pub(crate) enum Estimator {
    Logistic {
        classes: Vec<String>,
        coef: Array1<f64>,
        intercept: f64,
    },
    NaiveBayes {
        classes: Vec<String>,
        class_log_prior: Array1<f64>,
        feature_log_prob: Array2<f64>,
    },
}

impl Estimator {
    pub(crate) fn from_logistic(spec: LogisticRegression, n_features: usize) -> Result<Self, String> {
        check_classes(&spec.classes)?;
        if spec.coef.len() != n_features {
            return Err(format!(
                "LogisticRegression has {} coefficients but the vectorizer produces {} features",
                spec.coef.len(),
                n_features
            ));
        }
        if spec.coef.iter().any(|c| !c.is_finite()) || !spec.intercept.is_finite() {
            return Err("LogisticRegression contains non-finite weights".into());
        }
        Ok(Self::Logistic {
            classes: spec.classes,
            coef: Array1::from(spec.coef),
            intercept: spec.intercept,
        })
    }

    pub(crate) fn from_naive_bayes(spec: MultinomialNb, n_features: usize) -> Result<Self, String> {
        check_classes(&spec.classes)?;
        if spec.class_log_prior.len() != 2 || spec.feature_log_prob.len() != 2 {
            return Err("MultinomialNB must have exactly two class rows".into());
        }
        if let Some(row) = spec.feature_log_prob.iter().find(|row| row.len() != n_features) {
            return Err(format!(
                "MultinomialNB has a feature row of length {} but the vectorizer produces {} features",
                row.len(),
                n_features
            ));
        }
        let flat: Vec<f64> = spec.feature_log_prob.into_iter().flatten().collect();
        let feature_log_prob = Array2::from_shape_vec((2, n_features), flat)
            .map_err(|e| format!("Failed to shape MultinomialNB weights: {}", e))?;
        Ok(Self::NaiveBayes {
            classes: spec.classes,
            class_log_prior: Array1::from(spec.class_log_prior),
            feature_log_prob,
        })
    }

    pub(crate) fn type_name(&self) -> &'static str {
        match self {
            Self::Logistic { .. } => "LogisticRegression",
            Self::NaiveBayes { .. } => "MultinomialNB",
        }
    }

    pub(crate) fn classes(&self) -> &[String] {
        match self {
            Self::Logistic { classes, .. } | Self::NaiveBayes { classes, .. } => classes,
        }
    }

    /// Probabilities in the estimator's own class order.
    pub(crate) fn predict_proba(&self, features: &Array1<f64>) -> [f64; 2] {
        match self {
            Self::Logistic { coef, intercept, .. } => {
                let p = sigmoid(coef.dot(features) + intercept);
                [1.0 - p, p]
            }
            Self::NaiveBayes {
                class_log_prior,
                feature_log_prob,
                ..
            } => {
                let jll = feature_log_prob.dot(features) + class_log_prior;
                softmax_pair(jll[0], jll[1])
            }
        }
    }

    /// Index of the predicted class; ties go to the first class.
    pub(crate) fn predict_index(&self, features: &Array1<f64>) -> usize {
        match self {
            Self::Logistic { coef, intercept, .. } => {
                if coef.dot(features) + intercept > 0.0 {
                    1
                } else {
                    0
                }
            }
            Self::NaiveBayes {
                class_log_prior,
                feature_log_prob,
                ..
            } => {
                let jll = feature_log_prob.dot(features) + class_log_prior;
                if jll[1] > jll[0] {
                    1
                } else {
                    0
                }
            }
        }
    }
}

fn check_classes(classes: &[String]) -> Result<(), String> {
    let mut sorted: Vec<&str> = classes.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    if sorted != ["negative", "positive"] {
        return Err(format!(
            "Estimator classes must be exactly [\"negative\", \"positive\"], got {:?}",
            classes
        ));
    }
    Ok(())
}
