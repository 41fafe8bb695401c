use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::coercion::{parse_agreed, parse_seconds, Flexible};
use crate::errors::BackendError;

/// Who conducted a negotiation call.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CallType {
    Manual,
    Agent,
}

/// The tone of a negotiation call.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

/// A single negotiation call attached to a shipment. Immutable after
/// creation; removed only by the owning shipment's bulk clear or delete.
#[derive(Clone, Debug, Serialize)]
pub struct Call {
    /// The internal ID of the call.
    pub id: Uuid,

    /// The internal ID of the owning shipment. A lookup reference only.
    pub shipment_id: Uuid,

    /// Whether the carrier agreed on this call.
    pub agreed: bool,

    /// The duration of the call in seconds.
    pub seconds: f64,

    /// Who conducted the call.
    pub call_type: CallType,

    /// The tone of the call.
    pub sentiment: Sentiment,

    /// An external call identifier, if the telephony system provided one.
    pub call_id: Option<String>,

    /// Free-text notes.
    pub notes: Option<String>,

    /// The date and time the call was recorded.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// The caller-supplied fields for a new call. `agreed` and `seconds`
/// arrive from telephony webhooks that stringify everything, so both
/// accept their native type or a parseable string.
#[derive(Clone, Debug, Deserialize)]
pub struct NewCall {
    pub agreed: Flexible<bool>,
    pub seconds: Flexible<f64>,
    pub call_type: CallType,
    pub sentiment: Sentiment,
    #[serde(default)]
    pub call_id: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewCall {
    /// Coerces the flexible fields and materializes the call record.
    pub fn into_call(self, shipment_id: Uuid, now: OffsetDateTime) -> Result<Call, BackendError> {
        let agreed = parse_agreed(&self.agreed)?;
        let seconds = parse_seconds(&self.seconds)?;

        Ok(Call {
            id: Uuid::new_v4(),
            shipment_id,
            agreed,
            seconds,
            call_type: self.call_type,
            sentiment: self.sentiment,
            call_id: self.call_id,
            notes: self.notes,
            created_at: now,
        })
    }
}

/// A call joined with display fields from its owning shipment, for
/// cross-shipment listings.
#[derive(Clone, Debug, Serialize)]
pub struct AnnotatedCall {
    #[serde(flatten)]
    pub call: Call,

    /// The owning shipment's load ID.
    pub load_id: String,

    /// The owning shipment's origin.
    pub origin: String,

    /// The owning shipment's destination.
    pub destination: String,
}

/// Exact-match filters for cross-shipment call listings. Conjunctive.
#[derive(Clone, Debug, Default)]
pub struct CallFilters {
    pub call_type: Option<CallType>,
    pub agreed: Option<bool>,
    pub sentiment: Option<Sentiment>,
}

impl CallFilters {
    pub fn matches(&self, call: &Call) -> bool {
        if let Some(call_type) = self.call_type {
            if call.call_type != call_type {
                return false;
            }
        }

        if let Some(agreed) = self.agreed {
            if call.agreed != agreed {
                return false;
            }
        }

        if let Some(sentiment) = self.sentiment {
            if call.sentiment != sentiment {
                return false;
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    fn new_call(json: serde_json::Value) -> NewCall {
        serde_json::from_value(json).expect("deserialize call payload")
    }

    #[test]
    fn native_and_string_inputs_agree() {
        let now = datetime!(2025-01-01 00:00:00 UTC);
        let shipment_id = Uuid::new_v4();

        let native = new_call(serde_json::json!({
            "agreed": true,
            "seconds": 750.0,
            "call_type": "agent",
            "sentiment": "positive"
        }))
        .into_call(shipment_id, now)
        .expect("build call from native payload");

        let stringly = new_call(serde_json::json!({
            "agreed": "yes",
            "seconds": "750",
            "call_type": "agent",
            "sentiment": "positive"
        }))
        .into_call(shipment_id, now)
        .expect("build call from string payload");

        assert_eq!(native.agreed, stringly.agreed);
        assert_eq!(native.seconds, stringly.seconds);
    }

    #[test]
    fn unparseable_agreed_is_rejected() {
        let now = datetime!(2025-01-01 00:00:00 UTC);

        let result = new_call(serde_json::json!({
            "agreed": "maybe",
            "seconds": 30,
            "call_type": "manual",
            "sentiment": "neutral"
        }))
        .into_call(Uuid::new_v4(), now);

        match result {
            Err(BackendError::UnparseableBool { value }) => assert_eq!(value, "maybe"),
            other => panic!("expected UnparseableBool, got {:?}", other),
        }
    }

    #[test]
    fn filters_are_conjunctive() {
        let now = datetime!(2025-01-01 00:00:00 UTC);
        let call = new_call(serde_json::json!({
            "agreed": true,
            "seconds": 120,
            "call_type": "agent",
            "sentiment": "positive"
        }))
        .into_call(Uuid::new_v4(), now)
        .expect("build call");

        let matching = CallFilters {
            call_type: Some(CallType::Agent),
            agreed: Some(true),
            sentiment: None,
        };
        assert!(matching.matches(&call));

        let mismatched = CallFilters {
            call_type: Some(CallType::Agent),
            agreed: Some(false),
            sentiment: None,
        };
        assert!(!mismatched.matches(&call));
    }
}
