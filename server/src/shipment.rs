use serde::{Deserialize, Deserializer, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::errors::BackendError;

/// Where a load stands in its lifecycle.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Pending,
    Agreed,
}

impl Default for Status {
    fn default() -> Self {
        Status::Pending
    }
}

/// The times a record was created and last modified.
#[derive(Clone, Debug, Serialize)]
pub struct Times {
    /// The date and time it was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,

    /// The date and time it was last modified.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// A single load in the ledger.
#[derive(Clone, Debug, Serialize)]
pub struct Shipment {
    /// The internal ID of the load.
    pub id: Uuid,

    /// The human-readable load ID (e.g. LD-2025-0001). Must be unique
    /// across live records.
    pub load_id: String,

    /// The origin location.
    pub origin: String,

    /// The destination location.
    pub destination: String,

    /// The pickup date and time.
    #[serde(with = "time::serde::rfc3339")]
    pub pickup_datetime: OffsetDateTime,

    /// The delivery date and time. Always after the pickup.
    #[serde(with = "time::serde::rfc3339")]
    pub delivery_datetime: OffsetDateTime,

    /// The equipment type (e.g. Dry Van, Reefer, Flatbed).
    pub equipment_type: Option<String>,

    /// The rate listed on the load board.
    pub loadboard_rate: Option<f64>,

    /// Free-text notes.
    pub notes: Option<String>,

    /// The weight in pounds.
    pub weight: Option<f64>,

    /// The type of commodity carried.
    pub commodity_type: Option<String>,

    /// The number of pieces.
    pub num_of_pieces: Option<i64>,

    /// The distance in miles.
    pub miles: Option<f64>,

    /// The dimensions (e.g. 48x40x60 in).
    pub dimensions: Option<String>,

    /// The price agreed with the carrier. Required once agreed.
    pub agreed_price: Option<f64>,

    /// The carrier's description/name. Required once agreed.
    pub carrier_description: Option<String>,

    /// True when the most recent create/update came through the API path,
    /// false when it came through the manual path.
    pub assigned_via_url: bool,

    /// The actual time per call in seconds, entered by an operator.
    pub time_per_call_seconds: Option<f64>,

    /// The time per call used for reporting. Mirrors
    /// `time_per_call_seconds` when one was entered; otherwise a
    /// provisional per-path default assigned when the load was agreed.
    pub avg_time_per_call_seconds: Option<f64>,

    /// Where the load stands.
    pub status: Status,

    #[serde(flatten)]
    pub times: Times,
}

/// The caller-supplied fields for a new load.
#[derive(Clone, Debug, Deserialize)]
pub struct NewShipment {
    pub load_id: String,
    pub origin: String,
    pub destination: String,
    #[serde(with = "time::serde::rfc3339")]
    pub pickup_datetime: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub delivery_datetime: OffsetDateTime,
    #[serde(default)]
    pub equipment_type: Option<String>,
    #[serde(default)]
    pub loadboard_rate: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub commodity_type: Option<String>,
    #[serde(default)]
    pub num_of_pieces: Option<i64>,
    #[serde(default)]
    pub miles: Option<f64>,
    #[serde(default)]
    pub dimensions: Option<String>,
    #[serde(default)]
    pub agreed_price: Option<f64>,
    #[serde(default)]
    pub carrier_description: Option<String>,
    #[serde(default)]
    pub time_per_call_seconds: Option<f64>,
    #[serde(default)]
    pub avg_time_per_call_seconds: Option<f64>,
    #[serde(default)]
    pub status: Option<Status>,
}

impl NewShipment {
    /// Materializes the record: generates the internal ID, stamps both
    /// timestamps with the same instant and tags the assignment source.
    pub fn into_shipment(self, assigned_via_url: bool, now: OffsetDateTime) -> Shipment {
        Shipment {
            id: Uuid::new_v4(),
            load_id: self.load_id,
            origin: self.origin,
            destination: self.destination,
            pickup_datetime: self.pickup_datetime,
            delivery_datetime: self.delivery_datetime,
            equipment_type: self.equipment_type,
            loadboard_rate: self.loadboard_rate,
            notes: self.notes,
            weight: self.weight,
            commodity_type: self.commodity_type,
            num_of_pieces: self.num_of_pieces,
            miles: self.miles,
            dimensions: self.dimensions,
            agreed_price: self.agreed_price,
            carrier_description: self.carrier_description,
            assigned_via_url,
            time_per_call_seconds: self.time_per_call_seconds,
            avg_time_per_call_seconds: self.avg_time_per_call_seconds,
            status: self.status.unwrap_or_default(),
            times: Times {
                created_at: now,
                updated_at: now,
            },
        }
    }
}

/// A partial update. Every field is tagged with its presence in the
/// payload: the outer `Option` distinguishes "absent" from "supplied",
/// and for nullable fields the inner `Option` carries an explicit null.
/// Only supplied fields are applied; the rest of the record is untouched.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ShipmentPatch {
    #[serde(default)]
    pub load_id: Option<String>,
    #[serde(default)]
    pub origin: Option<String>,
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub pickup_datetime: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub delivery_datetime: Option<OffsetDateTime>,
    #[serde(default, deserialize_with = "tagged_presence")]
    pub equipment_type: Option<Option<String>>,
    #[serde(default, deserialize_with = "tagged_presence")]
    pub loadboard_rate: Option<Option<f64>>,
    #[serde(default, deserialize_with = "tagged_presence")]
    pub notes: Option<Option<String>>,
    #[serde(default, deserialize_with = "tagged_presence")]
    pub weight: Option<Option<f64>>,
    #[serde(default, deserialize_with = "tagged_presence")]
    pub commodity_type: Option<Option<String>>,
    #[serde(default, deserialize_with = "tagged_presence")]
    pub num_of_pieces: Option<Option<i64>>,
    #[serde(default, deserialize_with = "tagged_presence")]
    pub miles: Option<Option<f64>>,
    #[serde(default, deserialize_with = "tagged_presence")]
    pub dimensions: Option<Option<String>>,
    #[serde(default, deserialize_with = "tagged_presence")]
    pub agreed_price: Option<Option<f64>>,
    #[serde(default, deserialize_with = "tagged_presence")]
    pub carrier_description: Option<Option<String>>,
    #[serde(default, deserialize_with = "tagged_presence")]
    pub time_per_call_seconds: Option<Option<f64>>,
    #[serde(default, deserialize_with = "tagged_presence")]
    pub avg_time_per_call_seconds: Option<Option<f64>>,
    #[serde(default)]
    pub status: Option<Status>,
}

impl ShipmentPatch {
    /// Applies every supplied field to `shipment`, leaving the rest alone.
    /// Assignment-source bookkeeping and timestamps are the ledger's job.
    pub fn apply(&self, shipment: &mut Shipment) {
        if let Some(load_id) = &self.load_id {
            shipment.load_id = load_id.clone();
        }
        if let Some(origin) = &self.origin {
            shipment.origin = origin.clone();
        }
        if let Some(destination) = &self.destination {
            shipment.destination = destination.clone();
        }
        if let Some(pickup_datetime) = self.pickup_datetime {
            shipment.pickup_datetime = pickup_datetime;
        }
        if let Some(delivery_datetime) = self.delivery_datetime {
            shipment.delivery_datetime = delivery_datetime;
        }
        if let Some(equipment_type) = &self.equipment_type {
            shipment.equipment_type = equipment_type.clone();
        }
        if let Some(loadboard_rate) = self.loadboard_rate {
            shipment.loadboard_rate = loadboard_rate;
        }
        if let Some(notes) = &self.notes {
            shipment.notes = notes.clone();
        }
        if let Some(weight) = self.weight {
            shipment.weight = weight;
        }
        if let Some(commodity_type) = &self.commodity_type {
            shipment.commodity_type = commodity_type.clone();
        }
        if let Some(num_of_pieces) = self.num_of_pieces {
            shipment.num_of_pieces = num_of_pieces;
        }
        if let Some(miles) = self.miles {
            shipment.miles = miles;
        }
        if let Some(dimensions) = &self.dimensions {
            shipment.dimensions = dimensions.clone();
        }
        if let Some(agreed_price) = self.agreed_price {
            shipment.agreed_price = agreed_price;
        }
        if let Some(carrier_description) = &self.carrier_description {
            shipment.carrier_description = carrier_description.clone();
        }
        if let Some(time_per_call_seconds) = self.time_per_call_seconds {
            shipment.time_per_call_seconds = time_per_call_seconds;
        }
        if let Some(avg_time_per_call_seconds) = self.avg_time_per_call_seconds {
            shipment.avg_time_per_call_seconds = avg_time_per_call_seconds;
        }
        if let Some(status) = self.status {
            shipment.status = status;
        }
    }
}

/// Deserializes a nullable patch field, recording that it was present.
fn tagged_presence<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

const MAX_LOAD_ID: usize = 50;
const MAX_LOCATION: usize = 200;
const MAX_LABEL: usize = 100;
const MAX_DESCRIPTION: usize = 200;
const MAX_NOTES: usize = 1000;

/// Checks the record invariants. Run against a freshly-built record on
/// creation and against the merged record on every update.
pub fn validate(shipment: &Shipment) -> Result<(), BackendError> {
    check_text("load_id", &shipment.load_id, MAX_LOAD_ID)?;
    check_text("origin", &shipment.origin, MAX_LOCATION)?;
    check_text("destination", &shipment.destination, MAX_LOCATION)?;
    check_optional_length("equipment_type", &shipment.equipment_type, MAX_LABEL)?;
    check_optional_length("commodity_type", &shipment.commodity_type, MAX_LABEL)?;
    check_optional_length("dimensions", &shipment.dimensions, MAX_DESCRIPTION)?;
    check_optional_length(
        "carrier_description",
        &shipment.carrier_description,
        MAX_DESCRIPTION,
    )?;
    check_optional_length("notes", &shipment.notes, MAX_NOTES)?;

    check_non_negative("loadboard_rate", shipment.loadboard_rate)?;
    check_non_negative("weight", shipment.weight)?;
    check_non_negative("miles", shipment.miles)?;
    check_non_negative("agreed_price", shipment.agreed_price)?;
    check_non_negative("time_per_call_seconds", shipment.time_per_call_seconds)?;
    check_non_negative(
        "avg_time_per_call_seconds",
        shipment.avg_time_per_call_seconds,
    )?;
    check_non_negative("num_of_pieces", shipment.num_of_pieces.map(|n| n as f64))?;

    if shipment.delivery_datetime <= shipment.pickup_datetime {
        return Err(BackendError::DeliveryBeforePickup);
    }

    if shipment.status == Status::Agreed {
        if shipment.agreed_price.is_none() {
            return Err(BackendError::MissingAgreedField {
                field: "agreed_price",
            });
        }

        let carrier_blank = shipment
            .carrier_description
            .as_ref()
            .map(|c| c.trim().is_empty())
            .unwrap_or(true);

        if carrier_blank {
            return Err(BackendError::MissingAgreedField {
                field: "carrier_description",
            });
        }
    }

    Ok(())
}

fn check_text(field: &'static str, value: &str, max: usize) -> Result<(), BackendError> {
    if value.is_empty() {
        return Err(BackendError::EmptyField { field });
    }

    check_length(field, value, max)
}

fn check_optional_length(
    field: &'static str,
    value: &Option<String>,
    max: usize,
) -> Result<(), BackendError> {
    match value {
        Some(value) => check_length(field, value, max),
        None => Ok(()),
    }
}

fn check_length(field: &'static str, value: &str, max: usize) -> Result<(), BackendError> {
    if value.chars().count() > max {
        Err(BackendError::FieldTooLong { field, max })
    } else {
        Ok(())
    }
}

fn check_non_negative(field: &'static str, value: Option<f64>) -> Result<(), BackendError> {
    match value {
        Some(value) if value < 0.0 => Err(BackendError::NegativeNumber { field, value }),
        _ => Ok(()),
    }
}
