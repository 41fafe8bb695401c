use std::collections::HashMap;
use std::fs;
use std::path::Path;

use log::{info, warn, Logger};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::errors::BackendError;
use crate::ledger::Ledger;
use crate::normalization::normalize_field;
use crate::shipment::{NewShipment, Status};

const REQUIRED_COLUMNS: [&str; 5] = [
    "load_id",
    "origin",
    "destination",
    "pickup_datetime",
    "delivery_datetime",
];

/// Loads historical shipments from a CSV export on startup. Rows pass
/// through the ordinary creation path as manual records; a load ID
/// collision is retried with a `-DUP{n}` suffix. A missing file is not
/// an error.
pub async fn load_from_path<L: Ledger + ?Sized>(logger: &Logger, ledger: &L, path: &Path) -> usize {
    if !path.exists() {
        info!(logger, "Seed data file not found, skipping data load"; "path" => %path.display());
        return 0;
    }

    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            warn!(logger, "Could not read seed data file"; "path" => %path.display(), "error" => %e);
            return 0;
        }
    };

    import(logger, ledger, parse_rows(logger, &text)).await
}

/// Feeds parsed rows through `Ledger::create`, renaming collided load
/// IDs with a `-DUP{n}` suffix.
async fn import<L: Ledger + ?Sized>(logger: &Logger, ledger: &L, rows: Vec<NewShipment>) -> usize {
    let mut loaded = 0;
    let mut duplicates = 0;

    for mut data in rows {
        let base = data.load_id.clone();

        loop {
            match ledger.create(data.clone(), false).await {
                Ok(shipment) => {
                    loaded += 1;
                    info!(logger, "Loaded seed shipment"; "load_id" => &shipment.load_id);
                    break;
                }
                Err(BackendError::LoadIdExists { .. }) => {
                    duplicates += 1;
                    data.load_id = format!("{}-DUP{}", base, duplicates);
                    warn!(logger, "Duplicate load ID in seed data, renaming"; "load_id" => &base, "renamed" => &data.load_id);
                }
                Err(e) => {
                    warn!(logger, "Skipping invalid seed row"; "load_id" => &base, "error" => %e);
                    break;
                }
            }
        }
    }

    info!(logger, "Seed data load complete"; "loaded" => loaded, "renamed" => duplicates);

    loaded
}

/// Parses the CSV text into creation payloads, skipping rows that are
/// missing required fields or carry unreadable timestamps. Seed exports
/// are machine-written without embedded commas or quoting.
fn parse_rows(logger: &Logger, text: &str) -> Vec<NewShipment> {
    let mut lines = text.lines().filter(|line| !line.trim().is_empty());

    let header: Vec<String> = match lines.next() {
        Some(line) => line.split(',').map(normalize_field).collect(),
        None => return vec![],
    };

    let columns: HashMap<&str, usize> = header
        .iter()
        .enumerate()
        .map(|(index, name)| (name.as_str(), index))
        .collect();

    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .filter(|name| !columns.contains_key(**name))
        .copied()
        .collect();
    if !missing.is_empty() {
        warn!(logger, "Seed data is missing required columns"; "columns" => format!("{:?}", missing));
        return vec![];
    }

    let mut rows = vec![];

    for (number, line) in lines.enumerate() {
        let fields: Vec<&str> = line.split(',').collect();
        let cell = |name: &str| -> Option<String> {
            columns
                .get(name)
                .and_then(|index| fields.get(*index))
                .map(normalize_field)
                .filter(|value| !value.is_empty())
        };

        let required = (
            cell("load_id"),
            cell("origin"),
            cell("destination"),
            cell("pickup_datetime"),
            cell("delivery_datetime"),
        );

        let (load_id, origin, destination, pickup, delivery) = match required {
            (Some(a), Some(b), Some(c), Some(d), Some(e)) => (a, b, c, d, e),
            _ => {
                warn!(logger, "Skipping seed row with missing required fields"; "row" => number + 1);
                continue;
            }
        };

        let pickup_datetime = match OffsetDateTime::parse(&pickup, &Rfc3339) {
            Ok(parsed) => parsed,
            Err(_) => {
                warn!(logger, "Could not parse pickup_datetime"; "row" => number + 1, "value" => &pickup);
                continue;
            }
        };
        let delivery_datetime = match OffsetDateTime::parse(&delivery, &Rfc3339) {
            Ok(parsed) => parsed,
            Err(_) => {
                warn!(logger, "Could not parse delivery_datetime"; "row" => number + 1, "value" => &delivery);
                continue;
            }
        };

        let number_cell = |name: &'static str| -> Option<f64> {
            cell(name).and_then(|value| match value.parse() {
                Ok(parsed) => Some(parsed),
                Err(_) => {
                    warn!(logger, "Could not parse numeric seed field"; "row" => number + 1, "field" => name, "value" => &value);
                    None
                }
            })
        };

        let status = cell("status").and_then(|value| match value.to_lowercase().as_str() {
            "pending" => Some(Status::Pending),
            "agreed" => Some(Status::Agreed),
            _ => None,
        });

        rows.push(NewShipment {
            load_id,
            origin,
            destination,
            pickup_datetime,
            delivery_datetime,
            equipment_type: cell("equipment_type"),
            loadboard_rate: number_cell("loadboard_rate"),
            notes: cell("notes"),
            weight: number_cell("weight"),
            commodity_type: cell("commodity_type"),
            num_of_pieces: number_cell("num_of_pieces").map(|n| n as i64),
            miles: number_cell("miles"),
            dimensions: cell("dimensions"),
            agreed_price: None,
            carrier_description: None,
            time_per_call_seconds: None,
            avg_time_per_call_seconds: None,
            status,
        });
    }

    rows
}
