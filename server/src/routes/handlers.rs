use std::time::{Duration, Instant};

use log::{debug, info};
use time::OffsetDateTime;
use warp::{
    http::StatusCode,
    reject,
    reply::{json, with_header, with_status, Reply},
};

use crate::call::NewCall;
use crate::environment::Environment;
use crate::errors::BackendError;
use crate::routes::{
    query::{CallsQuery, RandomQuery, ShipmentsQuery},
    rejection::{Context, Rejection},
    response::SuccessResponse,
};
use crate::shipment::{NewShipment, ShipmentPatch};

const SERVER_TIMING_HEADER: &str = "server-timing";
type RouteResult = Result<Box<dyn Reply>, reject::Rejection>;

macro_rules! timed {
    ($($expression:stmt);+) => {
        let start = Instant::now();

        let result = { $($expression)+ };

        Ok(Box::new(with_header(
            result,
            SERVER_TIMING_HEADER,
            format_server_timing(start.elapsed()),
        )) as Box<dyn Reply>)
    };
}

pub async fn health(_environment: Environment) -> RouteResult {
    timed! {
        json(&SuccessResponse::Health {
            status: "healthy",
            timestamp: OffsetDateTime::now_utc(),
        })
    }
}

pub async fn debug(environment: Environment) -> RouteResult {
    timed! {
        let counts = environment
            .ledger
            .counts()
            .await
            .map_err(|e: BackendError| Rejection::reject(Context::debug(), e))?;

        json(&SuccessResponse::Debug {
            shipments_count: counts.shipments,
            phone_calls_count: counts.phone_calls,
        })
    }
}

pub async fn list(environment: Environment, query: ShipmentsQuery) -> RouteResult {
    timed! {
        let (filters, sort_by, sort_order) = query.into_parts();

        debug!(environment.logger, "Listing shipments..."; "sort_by" => ?sort_by, "sort_order" => ?sort_order);

        let shipments = environment
            .ledger
            .list(filters, sort_by, sort_order)
            .await
            .map_err(|e: BackendError| Rejection::reject(Context::list(), e))?;

        json(&shipments)
    }
}

pub async fn create(environment: Environment, data: NewShipment) -> RouteResult {
    timed! {
        let load_id = data.load_id.clone();
        let error_handler = |e: BackendError| Rejection::reject(Context::create(load_id.clone()), e);

        debug!(environment.logger, "Creating shipment..."; "load_id" => &load_id);

        let shipment = environment
            .ledger
            .create(data, true)
            .await
            .map_err(error_handler)?;

        info!(environment.logger, "Created shipment"; "id" => %shipment.id, "load_id" => &shipment.load_id);

        with_header(
            with_status(json(&shipment), StatusCode::CREATED),
            "location",
            environment.urls.shipment(&shipment.id).as_str(),
        )
    }
}

pub async fn stats(environment: Environment, query: ShipmentsQuery) -> RouteResult {
    timed! {
        let (filters, _, _) = query.into_parts();

        let stats = environment
            .ledger
            .stats(filters)
            .await
            .map_err(|e: BackendError| Rejection::reject(Context::stats(), e))?;

        json(&stats)
    }
}

pub async fn random(environment: Environment, query: RandomQuery) -> RouteResult {
    timed! {
        let RandomQuery { origin } = query;
        let error_handler =
            |e: BackendError| Rejection::reject(Context::random(origin.clone()), e);

        let shipment = environment
            .ledger
            .random_pending(origin.clone())
            .await
            .map_err(error_handler)?;

        json(&shipment)
    }
}

pub async fn retrieve(environment: Environment, identifier: String) -> RouteResult {
    timed! {
        let error_handler =
            |e: BackendError| Rejection::reject(Context::retrieve(identifier.clone()), e);

        debug!(environment.logger, "Retrieving shipment..."; "identifier" => &identifier);

        let shipment = environment
            .ledger
            .retrieve(identifier.clone())
            .await
            .map_err(error_handler)?;

        json(&shipment)
    }
}

pub async fn update(
    environment: Environment,
    identifier: String,
    patch: ShipmentPatch,
) -> RouteResult {
    apply_update(environment, identifier, patch, true).await
}

pub async fn update_manual(
    environment: Environment,
    identifier: String,
    patch: ShipmentPatch,
) -> RouteResult {
    apply_update(environment, identifier, patch, false).await
}

async fn apply_update(
    environment: Environment,
    identifier: String,
    patch: ShipmentPatch,
    via_url: bool,
) -> RouteResult {
    timed! {
        let error_handler =
            |e: BackendError| Rejection::reject(Context::update(identifier.clone()), e);

        debug!(environment.logger, "Updating shipment..."; "identifier" => &identifier, "via_url" => via_url);

        let shipment = environment
            .ledger
            .update(identifier.clone(), patch, via_url)
            .await
            .map_err(error_handler)?;

        info!(environment.logger, "Updated shipment"; "id" => %shipment.id, "assigned_via_url" => shipment.assigned_via_url);

        json(&shipment)
    }
}

pub async fn delete(environment: Environment, identifier: String) -> RouteResult {
    timed! {
        let error_handler =
            |e: BackendError| Rejection::reject(Context::delete(identifier.clone()), e);

        debug!(environment.logger, "Deleting shipment..."; "identifier" => &identifier);

        environment
            .ledger
            .delete(identifier.clone())
            .await
            .map_err(error_handler)?;

        info!(environment.logger, "Deleted shipment"; "identifier" => &identifier);

        StatusCode::NO_CONTENT
    }
}

pub async fn add_call(
    environment: Environment,
    identifier: String,
    data: NewCall,
) -> RouteResult {
    timed! {
        let error_handler =
            |e: BackendError| Rejection::reject(Context::add_call(identifier.clone()), e);

        debug!(environment.logger, "Recording phone call..."; "identifier" => &identifier);

        let call = environment
            .ledger
            .add_call(identifier.clone(), data)
            .await
            .map_err(error_handler)?;

        info!(environment.logger, "Recorded phone call"; "id" => %call.id, "shipment_id" => %call.shipment_id);

        with_status(json(&call), StatusCode::CREATED)
    }
}

pub async fn calls(environment: Environment, identifier: String) -> RouteResult {
    timed! {
        let error_handler =
            |e: BackendError| Rejection::reject(Context::calls(identifier.clone()), e);

        let calls = environment
            .ledger
            .calls(identifier.clone())
            .await
            .map_err(error_handler)?;

        json(&calls)
    }
}

pub async fn clear_calls(environment: Environment, identifier: String) -> RouteResult {
    timed! {
        let error_handler =
            |e: BackendError| Rejection::reject(Context::clear_calls(identifier.clone()), e);

        debug!(environment.logger, "Clearing phone calls..."; "identifier" => &identifier);

        environment
            .ledger
            .clear_calls(identifier.clone())
            .await
            .map_err(error_handler)?;

        StatusCode::NO_CONTENT
    }
}

pub async fn all_calls(environment: Environment, query: CallsQuery) -> RouteResult {
    timed! {
        let calls = environment
            .ledger
            .all_calls(query.into_filters())
            .await
            .map_err(|e: BackendError| Rejection::reject(Context::all_calls(), e))?;

        json(&calls)
    }
}

fn format_server_timing(elapsed: Duration) -> String {
    format!("handler;dur={}", elapsed.as_secs_f64() * 1000.0)
}
