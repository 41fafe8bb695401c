use serde::Serialize;

use crate::call::{Call, CallType};
use crate::shipment::{Shipment, Status};

/// Totals for one call type across the filtered record set.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CallTypeStats {
    pub total_calls: usize,
    pub agreed_calls: usize,
    /// Total talk time in minutes, rounded to one decimal.
    pub total_minutes: f64,
}

/// Call totals split by who conducted the call. Summarizes the whole
/// filtered set, not one assignment-source bucket, and is therefore
/// attached unchanged to both buckets.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CallBreakdown {
    pub manual: CallTypeStats,
    pub agent: CallTypeStats,
}

/// Outcome totals for one assignment source. The count, price and
/// time-per-call figures cover agreed records only.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Bucket {
    pub count: usize,
    pub total_agreed_price: f64,
    pub total_agreed_minus_loadboard: f64,
    pub avg_time_per_call_seconds: f64,
    pub phone_calls: CallBreakdown,
}

/// The stats report: records split by assignment source.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Stats {
    pub manual: Bucket,
    pub url_api: Bucket,
}

/// Aggregates an already-filtered record set. Records land in the
/// `manual` or `url_api` bucket by their assignment-source flag; agreed
/// records contribute the price and time metrics.
pub fn aggregate(records: &[(Shipment, Vec<Call>)]) -> Stats {
    let mut manual = BucketAccumulator::default();
    let mut url_api = BucketAccumulator::default();

    for (shipment, _) in records {
        let accumulator = if shipment.assigned_via_url {
            &mut url_api
        } else {
            &mut manual
        };

        accumulator.observe(shipment);
    }

    let phone_calls = call_breakdown(records);

    Stats {
        manual: manual.into_bucket(phone_calls.clone()),
        url_api: url_api.into_bucket(phone_calls),
    }
}

fn call_breakdown(records: &[(Shipment, Vec<Call>)]) -> CallBreakdown {
    let mut manual = CallTypeAccumulator::default();
    let mut agent = CallTypeAccumulator::default();

    for (_, calls) in records {
        for call in calls {
            let accumulator = match call.call_type {
                CallType::Manual => &mut manual,
                CallType::Agent => &mut agent,
            };

            accumulator.total_calls += 1;
            if call.agreed {
                accumulator.agreed_calls += 1;
            }
            accumulator.total_seconds += call.seconds;
        }
    }

    CallBreakdown {
        manual: manual.into_stats(),
        agent: agent.into_stats(),
    }
}

#[derive(Default)]
struct BucketAccumulator {
    count: usize,
    total_agreed_price: f64,
    total_agreed_minus_loadboard: f64,
    time_per_call_sum: f64,
    time_per_call_samples: usize,
}

impl BucketAccumulator {
    fn observe(&mut self, shipment: &Shipment) {
        if shipment.status != Status::Agreed {
            return;
        }

        self.count += 1;

        let price = shipment.agreed_price.unwrap_or(0.0);
        self.total_agreed_price += price;
        self.total_agreed_minus_loadboard += price - shipment.loadboard_rate.unwrap_or(0.0);

        if let Some(seconds) = shipment.time_per_call_seconds {
            if seconds > 0.0 {
                self.time_per_call_sum += seconds;
                self.time_per_call_samples += 1;
            }
        }
    }

    fn into_bucket(self, phone_calls: CallBreakdown) -> Bucket {
        let avg_time_per_call_seconds = if self.time_per_call_samples == 0 {
            0.0
        } else {
            self.time_per_call_sum / self.time_per_call_samples as f64
        };

        Bucket {
            count: self.count,
            total_agreed_price: self.total_agreed_price,
            total_agreed_minus_loadboard: self.total_agreed_minus_loadboard,
            avg_time_per_call_seconds,
            phone_calls,
        }
    }
}

#[derive(Default)]
struct CallTypeAccumulator {
    total_calls: usize,
    agreed_calls: usize,
    total_seconds: f64,
}

impl CallTypeAccumulator {
    fn into_stats(self) -> CallTypeStats {
        CallTypeStats {
            total_calls: self.total_calls,
            agreed_calls: self.agreed_calls,
            total_minutes: round_to_tenth(self.total_seconds / 60.0),
        }
    }
}

fn round_to_tenth(minutes: f64) -> f64 {
    (minutes * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;
    use uuid::Uuid;

    use super::*;
    use crate::call::NewCall;
    use crate::shipment::NewShipment;

    fn agreed_shipment(
        load_id: &str,
        via_url: bool,
        price: f64,
        rate: f64,
        seconds: Option<f64>,
    ) -> Shipment {
        let data: NewShipment = serde_json::from_value(serde_json::json!({
            "load_id": load_id,
            "origin": "Madrid",
            "destination": "Paris",
            "pickup_datetime": "2025-01-15T08:00:00Z",
            "delivery_datetime": "2025-01-16T18:00:00Z",
            "status": "agreed",
            "agreed_price": price,
            "loadboard_rate": rate,
            "carrier_description": "Test Carrier",
            "time_per_call_seconds": seconds
        }))
        .expect("deserialize shipment payload");

        data.into_shipment(via_url, datetime!(2025-01-01 00:00:00 UTC))
    }

    fn call(call_type: CallType, agreed: bool, seconds: f64) -> Call {
        let payload: NewCall = serde_json::from_value(serde_json::json!({
            "agreed": agreed,
            "seconds": seconds,
            "call_type": match call_type {
                CallType::Manual => "manual",
                CallType::Agent => "agent",
            },
            "sentiment": "neutral"
        }))
        .expect("deserialize call payload");

        payload
            .into_call(Uuid::new_v4(), datetime!(2025-01-02 00:00:00 UTC))
            .expect("build call")
    }

    // Two agreed records, one per assignment source, with known figures.
    #[test]
    fn buckets_split_by_assignment_source() {
        let records = vec![
            (
                agreed_shipment("LD-1", true, 1500.0, 1400.0, Some(120.0)),
                vec![],
            ),
            (
                agreed_shipment("LD-2", false, 2000.0, 1800.0, Some(90.0)),
                vec![],
            ),
        ];

        let stats = aggregate(&records);

        assert_eq!(stats.manual.count, 1);
        assert_eq!(stats.manual.total_agreed_price, 2000.0);
        assert_eq!(stats.manual.total_agreed_minus_loadboard, 200.0);
        assert_eq!(stats.manual.avg_time_per_call_seconds, 90.0);

        assert_eq!(stats.url_api.count, 1);
        assert_eq!(stats.url_api.total_agreed_price, 1500.0);
        assert_eq!(stats.url_api.total_agreed_minus_loadboard, 100.0);
        assert_eq!(stats.url_api.avg_time_per_call_seconds, 120.0);
    }

    #[test]
    fn pending_records_contribute_nothing_to_price_metrics() {
        let data: NewShipment = serde_json::from_value(serde_json::json!({
            "load_id": "LD-3",
            "origin": "Berlin",
            "destination": "Rome",
            "pickup_datetime": "2025-01-15T08:00:00Z",
            "delivery_datetime": "2025-01-16T18:00:00Z"
        }))
        .expect("deserialize shipment payload");
        let pending = data.into_shipment(false, datetime!(2025-01-01 00:00:00 UTC));

        let stats = aggregate(&[(pending, vec![])]);

        assert_eq!(stats.manual.count, 0);
        assert_eq!(stats.manual.total_agreed_price, 0.0);
        assert_eq!(stats.manual.avg_time_per_call_seconds, 0.0);
    }

    #[test]
    fn non_positive_call_times_are_excluded_from_the_average() {
        let records = vec![
            (
                agreed_shipment("LD-1", false, 1000.0, 900.0, Some(0.0)),
                vec![],
            ),
            (
                agreed_shipment("LD-2", false, 1000.0, 900.0, Some(60.0)),
                vec![],
            ),
            (agreed_shipment("LD-3", false, 1000.0, 900.0, None), vec![]),
        ];

        let stats = aggregate(&records);

        assert_eq!(stats.manual.count, 3);
        assert_eq!(stats.manual.avg_time_per_call_seconds, 60.0);
    }

    #[test]
    fn call_breakdown_covers_the_whole_set_and_both_buckets() {
        let records = vec![
            (
                agreed_shipment("LD-1", true, 1500.0, 1400.0, None),
                vec![
                    call(CallType::Manual, true, 930.0),
                    call(CallType::Agent, false, 492.0),
                ],
            ),
            (
                agreed_shipment("LD-2", false, 2000.0, 1800.0, None),
                vec![call(CallType::Manual, true, 1326.0)],
            ),
        ];

        let stats = aggregate(&records);

        let expected = CallBreakdown {
            manual: CallTypeStats {
                total_calls: 2,
                agreed_calls: 2,
                // (930 + 1326) / 60 = 37.6
                total_minutes: 37.6,
            },
            agent: CallTypeStats {
                total_calls: 1,
                agreed_calls: 0,
                // 492 / 60 = 8.2
                total_minutes: 8.2,
            },
        };

        assert_eq!(stats.manual.phone_calls, expected);
        assert_eq!(stats.url_api.phone_calls, expected);
    }

    #[test]
    fn minutes_are_rounded_to_one_decimal() {
        let records = vec![(
            agreed_shipment("LD-1", false, 1000.0, 900.0, None),
            vec![call(CallType::Agent, true, 100.0)],
        )];

        let stats = aggregate(&records);

        // 100 / 60 = 1.666... -> 1.7
        assert_eq!(stats.manual.phone_calls.agent.total_minutes, 1.7);
    }
}
