use serde::Deserialize;

use crate::errors::BackendError;

/// A field that accepts either its native JSON type or a string rendering
/// of it. Upstream telephony integrations deliver both interchangeably.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum Flexible<T> {
    Native(T),
    Text(String),
}

const TRUE_WORDS: [&str; 4] = ["true", "1", "yes", "y"];
const FALSE_WORDS: [&str; 4] = ["false", "0", "no", "n"];

/// Reads an agreement flag: a native boolean, or one of the accepted
/// true/false words, case-insensitively.
pub fn parse_agreed(value: &Flexible<bool>) -> Result<bool, BackendError> {
    match value {
        Flexible::Native(agreed) => Ok(*agreed),
        Flexible::Text(text) => {
            let lowered = text.trim().to_lowercase();

            if TRUE_WORDS.contains(&lowered.as_str()) {
                Ok(true)
            } else if FALSE_WORDS.contains(&lowered.as_str()) {
                Ok(false)
            } else {
                Err(BackendError::UnparseableBool {
                    value: text.clone(),
                })
            }
        }
    }
}

/// Reads a call duration: a native number or a numeric string. Must be
/// finite and non-negative.
pub fn parse_seconds(value: &Flexible<f64>) -> Result<f64, BackendError> {
    let seconds = match value {
        Flexible::Native(seconds) => *seconds,
        Flexible::Text(text) => {
            text.trim()
                .parse::<f64>()
                .map_err(|_| BackendError::UnparseableNumber {
                    field: "seconds",
                    value: text.clone(),
                })?
        }
    };

    if !seconds.is_finite() {
        return Err(BackendError::UnparseableNumber {
            field: "seconds",
            value: seconds.to_string(),
        });
    }

    if seconds < 0.0 {
        return Err(BackendError::NegativeNumber {
            field: "seconds",
            value: seconds,
        });
    }

    Ok(seconds)
}
