use thiserror::Error;

/// Enumerates high-level errors returned by this library.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The identifier matched neither an internal ID nor a load ID.
    #[error("no shipment matches {identifier:?}")]
    NonExistentShipment { identifier: String },

    /// A load ID collision on creation (exact, case-sensitive match).
    #[error("load ID {load_id:?} already exists")]
    LoadIdExists { load_id: String },

    /// A delivery scheduled at or before its pickup.
    #[error("delivery_datetime must be after pickup_datetime")]
    DeliveryBeforePickup,

    /// A field that must accompany the agreed status was absent or blank.
    #[error("{field} is required when status is agreed")]
    MissingAgreedField { field: &'static str },

    /// A required text field was empty.
    #[error("{field} must not be empty")]
    EmptyField { field: &'static str },

    /// A text field exceeded its length bound.
    #[error("{field} must be at most {max} characters")]
    FieldTooLong { field: &'static str, max: usize },

    /// A numeric field carried a negative value.
    #[error("{field} must be non-negative, got {value}")]
    NegativeNumber { field: &'static str, value: f64 },

    /// A value that could not be read as a boolean.
    #[error("could not interpret {value:?} as a boolean")]
    UnparseableBool { value: String },

    /// A value that could not be read as a number.
    #[error("could not interpret {field} value {value:?} as a number")]
    UnparseableNumber { field: &'static str, value: String },

    /// The request carried a missing or wrong API key.
    #[error("invalid API key")]
    InvalidApiKey,
}

impl BackendError {
    pub fn not_found(identifier: impl Into<String>) -> Self {
        BackendError::NonExistentShipment {
            identifier: identifier.into(),
        }
    }
}
