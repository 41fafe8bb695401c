use serde::Deserialize;
use time::OffsetDateTime;

use crate::call::{CallFilters, CallType, Sentiment};
use crate::filter::{ShipmentFilters, SortKey, SortOrder};
use crate::shipment::Status;

/// Query-string parameters for shipment listings and stats.
#[derive(Debug, Default, Deserialize)]
pub struct ShipmentsQuery {
    status: Option<Status>,
    equipment_type: Option<String>,
    commodity_type: Option<String>,
    origin: Option<String>,
    destination: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pickup_from: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pickup_to: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    delivery_from: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    delivery_to: Option<OffsetDateTime>,
    q: Option<String>,
    assigned_via_url: Option<bool>,
    sort_by: Option<String>,
    sort_order: Option<String>,
}

impl ShipmentsQuery {
    pub fn into_parts(self) -> (ShipmentFilters, SortKey, SortOrder) {
        let sort_by = SortKey::parse(self.sort_by.as_deref());
        let sort_order = SortOrder::parse(self.sort_order.as_deref());

        let filters = ShipmentFilters {
            status: self.status,
            assigned_via_url: self.assigned_via_url,
            equipment_type: self.equipment_type,
            commodity_type: self.commodity_type,
            origin: self.origin,
            destination: self.destination,
            pickup_from: self.pickup_from,
            pickup_to: self.pickup_to,
            delivery_from: self.delivery_from,
            delivery_to: self.delivery_to,
            q: self.q,
        };

        (filters, sort_by, sort_order)
    }
}

/// Query-string parameters for the random-pending pick.
#[derive(Debug, Default, Deserialize)]
pub struct RandomQuery {
    pub origin: Option<String>,
}

/// Query-string parameters for cross-shipment call listings.
#[derive(Debug, Default, Deserialize)]
pub struct CallsQuery {
    call_type: Option<CallType>,
    agreed: Option<bool>,
    sentiment: Option<Sentiment>,
}

impl CallsQuery {
    pub fn into_filters(self) -> CallFilters {
        CallFilters {
            call_type: self.call_type,
            agreed: self.agreed,
            sentiment: self.sentiment,
        }
    }
}
