use std::cmp::Ordering;

use time::OffsetDateTime;

use crate::shipment::{Shipment, Status};

/// Filters for shipment listings. All are optional and conjunctive: a
/// record must satisfy every supplied filter to be included.
#[derive(Clone, Debug, Default)]
pub struct ShipmentFilters {
    /// Exact status match.
    pub status: Option<Status>,

    /// Exact assignment-source match.
    pub assigned_via_url: Option<bool>,

    /// Case-insensitive substring matches.
    pub equipment_type: Option<String>,
    pub commodity_type: Option<String>,
    pub origin: Option<String>,
    pub destination: Option<String>,

    /// Inclusive timestamp windows.
    pub pickup_from: Option<OffsetDateTime>,
    pub pickup_to: Option<OffsetDateTime>,
    pub delivery_from: Option<OffsetDateTime>,
    pub delivery_to: Option<OffsetDateTime>,

    /// Free-text search against load_id, origin, destination,
    /// commodity_type and notes; a record matches if any field matches.
    pub q: Option<String>,
}

impl ShipmentFilters {
    pub fn matches(&self, shipment: &Shipment) -> bool {
        if let Some(status) = self.status {
            if shipment.status != status {
                return false;
            }
        }

        if let Some(assigned_via_url) = self.assigned_via_url {
            if shipment.assigned_via_url != assigned_via_url {
                return false;
            }
        }

        if let Some(equipment_type) = &self.equipment_type {
            if !contains_insensitive(&shipment.equipment_type, equipment_type) {
                return false;
            }
        }

        if let Some(commodity_type) = &self.commodity_type {
            if !contains_insensitive(&shipment.commodity_type, commodity_type) {
                return false;
            }
        }

        if let Some(origin) = &self.origin {
            if !text_contains_insensitive(&shipment.origin, origin) {
                return false;
            }
        }

        if let Some(destination) = &self.destination {
            if !text_contains_insensitive(&shipment.destination, destination) {
                return false;
            }
        }

        if let Some(pickup_from) = self.pickup_from {
            if shipment.pickup_datetime < pickup_from {
                return false;
            }
        }

        if let Some(pickup_to) = self.pickup_to {
            if shipment.pickup_datetime > pickup_to {
                return false;
            }
        }

        if let Some(delivery_from) = self.delivery_from {
            if shipment.delivery_datetime < delivery_from {
                return false;
            }
        }

        if let Some(delivery_to) = self.delivery_to {
            if shipment.delivery_datetime > delivery_to {
                return false;
            }
        }

        if let Some(q) = &self.q {
            if !matches_free_text(shipment, q) {
                return false;
            }
        }

        true
    }
}

fn matches_free_text(shipment: &Shipment, q: &str) -> bool {
    text_contains_insensitive(&shipment.load_id, q)
        || text_contains_insensitive(&shipment.origin, q)
        || text_contains_insensitive(&shipment.destination, q)
        || contains_insensitive(&shipment.commodity_type, q)
        || contains_insensitive(&shipment.notes, q)
}

fn text_contains_insensitive(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn contains_insensitive(haystack: &Option<String>, needle: &str) -> bool {
    haystack
        .as_deref()
        .map(|h| text_contains_insensitive(h, needle))
        .unwrap_or(false)
}

/// The fields a listing can be ordered by. Anything unrecognized falls
/// back to creation time.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SortKey {
    CreatedAt,
    PickupDatetime,
    DeliveryDatetime,
    LoadboardRate,
    Miles,
}

impl SortKey {
    pub fn parse(key: Option<&str>) -> SortKey {
        match key {
            Some("pickup_datetime") => SortKey::PickupDatetime,
            Some("delivery_datetime") => SortKey::DeliveryDatetime,
            Some("loadboard_rate") => SortKey::LoadboardRate,
            Some("miles") => SortKey::Miles,
            _ => SortKey::CreatedAt,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn parse(order: Option<&str>) -> SortOrder {
        match order.map(str::to_lowercase).as_deref() {
            Some("asc") => SortOrder::Ascending,
            _ => SortOrder::Descending,
        }
    }
}

/// Produces the filtered, ordered view of `shipments`. Pure: the store is
/// never touched. The sort is stable, so records with equal keys keep
/// their relative insertion order under either direction.
pub fn query(
    mut shipments: Vec<Shipment>,
    filters: &ShipmentFilters,
    sort_by: SortKey,
    sort_order: SortOrder,
) -> Vec<Shipment> {
    shipments.retain(|shipment| filters.matches(shipment));

    match sort_order {
        SortOrder::Ascending => shipments.sort_by(|a, b| compare(a, b, sort_by)),
        SortOrder::Descending => shipments.sort_by(|a, b| compare(b, a, sort_by)),
    }

    shipments
}

/// Numeric keys treat a missing value as zero.
fn compare(a: &Shipment, b: &Shipment, key: SortKey) -> Ordering {
    match key {
        SortKey::CreatedAt => a.times.created_at.cmp(&b.times.created_at),
        SortKey::PickupDatetime => a.pickup_datetime.cmp(&b.pickup_datetime),
        SortKey::DeliveryDatetime => a.delivery_datetime.cmp(&b.delivery_datetime),
        SortKey::LoadboardRate => a
            .loadboard_rate
            .unwrap_or(0.0)
            .total_cmp(&b.loadboard_rate.unwrap_or(0.0)),
        SortKey::Miles => a.miles.unwrap_or(0.0).total_cmp(&b.miles.unwrap_or(0.0)),
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;
    use time::Duration;

    use super::*;
    use crate::shipment::{NewShipment, Shipment};

    fn shipment(load_id: &str, origin: &str, destination: &str, offset_hours: i64) -> Shipment {
        let data: NewShipment = serde_json::from_value(serde_json::json!({
            "load_id": load_id,
            "origin": origin,
            "destination": destination,
            "pickup_datetime": "2025-01-15T08:00:00Z",
            "delivery_datetime": "2025-01-16T18:00:00Z"
        }))
        .expect("deserialize shipment payload");

        let created = datetime!(2025-01-01 00:00:00 UTC) + Duration::hours(offset_hours);
        data.into_shipment(false, created)
    }

    #[test]
    fn filters_are_conjunctive() {
        let mut matching = shipment("LD-1", "Madrid", "Paris", 0);
        matching.equipment_type = Some("Dry Van".to_owned());
        matching.status = Status::Pending;

        let mut partial = shipment("LD-2", "Madrid", "Lyon", 1);
        partial.equipment_type = Some("Reefer".to_owned());
        partial.status = Status::Pending;

        let filters = ShipmentFilters {
            status: Some(Status::Pending),
            origin: Some("madrid".to_owned()),
            equipment_type: Some("dry".to_owned()),
            ..ShipmentFilters::default()
        };

        let results = query(
            vec![matching.clone(), partial],
            &filters,
            SortKey::CreatedAt,
            SortOrder::Ascending,
        );

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].load_id, "LD-1");
    }

    #[test]
    fn free_text_matches_any_of_five_fields() {
        let mut by_notes = shipment("LD-1", "Madrid", "Paris", 0);
        by_notes.notes = Some("handle with care".to_owned());

        let by_code = shipment("CARE-2", "Berlin", "Rome", 1);
        let unrelated = shipment("LD-3", "Lisbon", "Porto", 2);

        let filters = ShipmentFilters {
            q: Some("care".to_owned()),
            ..ShipmentFilters::default()
        };

        let results = query(
            vec![by_notes, by_code, unrelated],
            &filters,
            SortKey::CreatedAt,
            SortOrder::Ascending,
        );

        let codes: Vec<_> = results.iter().map(|s| s.load_id.as_str()).collect();
        assert_eq!(codes, vec!["LD-1", "CARE-2"]);
    }

    #[test]
    fn timestamp_windows_are_inclusive() {
        let record = shipment("LD-1", "Madrid", "Paris", 0);

        let filters = ShipmentFilters {
            pickup_from: Some(record.pickup_datetime),
            pickup_to: Some(record.pickup_datetime),
            ..ShipmentFilters::default()
        };

        let results = query(
            vec![record],
            &filters,
            SortKey::CreatedAt,
            SortOrder::Ascending,
        );
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn sort_falls_back_to_created_at_and_defaults_descending() {
        assert_eq!(SortKey::parse(Some("garbage")), SortKey::CreatedAt);
        assert_eq!(SortKey::parse(None), SortKey::CreatedAt);
        assert_eq!(SortOrder::parse(None), SortOrder::Descending);
        assert_eq!(SortOrder::parse(Some("ASC")), SortOrder::Ascending);
    }

    #[test]
    fn equal_keys_preserve_insertion_order_in_both_directions() {
        let mut first = shipment("LD-1", "Madrid", "Paris", 0);
        first.loadboard_rate = Some(1000.0);
        let mut second = shipment("LD-2", "Berlin", "Rome", 1);
        second.loadboard_rate = Some(1000.0);

        for order in &[SortOrder::Ascending, SortOrder::Descending] {
            let results = query(
                vec![first.clone(), second.clone()],
                &ShipmentFilters::default(),
                SortKey::LoadboardRate,
                *order,
            );

            let codes: Vec<_> = results.iter().map(|s| s.load_id.as_str()).collect();
            assert_eq!(codes, vec!["LD-1", "LD-2"], "order {:?}", order);
        }
    }

    #[test]
    fn missing_numeric_keys_sort_as_zero() {
        let mut cheap = shipment("LD-1", "Madrid", "Paris", 0);
        cheap.loadboard_rate = None;
        let mut pricey = shipment("LD-2", "Berlin", "Rome", 1);
        pricey.loadboard_rate = Some(500.0);

        let results = query(
            vec![pricey, cheap],
            &ShipmentFilters::default(),
            SortKey::LoadboardRate,
            SortOrder::Ascending,
        );

        let codes: Vec<_> = results.iter().map(|s| s.load_id.as_str()).collect();
        assert_eq!(codes, vec!["LD-1", "LD-2"]);
    }
}
