use std::sync::Arc;

use log::{error, Logger};
use warp::filters::BoxedFilter;
use warp::http::StatusCode;
use warp::reject;
use warp::reply::{json, with_status, Json, Reply, WithStatus};
use warp::Filter;

use crate::environment::Environment;
use crate::errors::BackendError;

pub mod admin;
mod auth;
mod handlers;
mod query;
mod rejection;
mod response;

pub use internal::*;

/// The maximum JSON body size to accept. Generous for any real payload;
/// the HTTP gateway enforces the effective limit.
const MAX_CONTENT_LENGTH: u64 = 1024 * 1024;

pub async fn format_rejection(
    logger: Arc<Logger>,
    rej: reject::Rejection,
) -> Result<WithStatus<Json>, reject::Rejection> {
    if let Some(r) = rej.find::<rejection::Rejection>() {
        let e = &r.error;
        error!(logger, "Backend error"; "context" => ?r.context, "error" => ?r.error, "status" => %status_code_for(e), "message" => %r.error);
        let flattened = r.flatten();

        return Ok(with_status(json(&flattened), status_code_for(e)));
    }

    Err(rej)
}

fn status_code_for(e: &BackendError) -> StatusCode {
    use BackendError::*;

    match e {
        NonExistentShipment { .. } => StatusCode::NOT_FOUND,
        LoadIdExists { .. } => StatusCode::CONFLICT,
        InvalidApiKey => StatusCode::UNAUTHORIZED,
        DeliveryBeforePickup
        | MissingAgreedField { .. }
        | EmptyField { .. }
        | FieldTooLong { .. }
        | NegativeNumber { .. }
        | UnparseableBool { .. }
        | UnparseableNumber { .. } => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

/// The whole main-server API: every route plus rejection formatting.
/// Route order matters where paths overlap: the fixed `stats` and
/// `random` segments must be tried before the identifier parameter.
pub fn make_api(environment: Environment) -> BoxedFilter<(Box<dyn Reply>,)> {
    let logger = environment.logger.clone();

    make_health_route(environment.clone())
        .or(make_debug_route(environment.clone()))
        .or(make_list_route(environment.clone()))
        .or(make_create_route(environment.clone()))
        .or(make_stats_route(environment.clone()))
        .or(make_random_route(environment.clone()))
        .or(make_all_calls_route(environment.clone()))
        .or(make_add_call_route(environment.clone()))
        .or(make_calls_route(environment.clone()))
        .or(make_clear_calls_route(environment.clone()))
        .or(make_manual_update_route(environment.clone()))
        .or(make_update_route(environment.clone()))
        .or(make_delete_route(environment.clone()))
        .or(make_retrieve_route(environment))
        .recover(move |r| format_rejection(logger.clone(), r))
        .map(|reply| Box::new(reply) as Box<dyn Reply>)
        .boxed()
}

mod internal {
    use warp::filters::BoxedFilter;
    use warp::path::end;
    use warp::path::param as par;
    use warp::Filter;
    use warp::Reply;
    use warp::{body, delete, get as g, patch, path as p, post, query};

    use super::{auth, handlers, query as q, MAX_CONTENT_LENGTH};
    use crate::environment::Environment;

    type Route = BoxedFilter<(Box<dyn Reply>,)>;

    macro_rules! route_filter {
    ($route_variable:ident; $first:expr) => (let $route_variable = $route_variable.and($first););
    ($route_variable:ident; $first:expr, $($rest:expr),+) => (
        let $route_variable = $route_variable.and($first);
        route_filter!($route_variable; $($rest),+);
    )
}

    macro_rules! route {
    ($name:ident => $handler:ident, $route_variable:ident, $environment:ident; $($filters:expr),+) => (
        pub fn $name($environment: Environment) -> Route {
            let $route_variable = warp::any().map({
                let environment = $environment.clone();
                move || environment.clone()
            });

            route_filter!($route_variable; $($filters),+);

            $route_variable.and_then(handlers::$handler)
                .boxed()
        }
    );
}

    fn key(environment: &Environment) -> impl Filter<Extract = (), Error = warp::reject::Rejection> + Clone {
        auth::require_api_key(environment.config.api_key.clone())
    }

    fn base(environment: &Environment) -> String {
        environment.urls.shipments_path.clone()
    }

    route!(make_health_route => health, rt, env; p("health"), end(), g());
    route!(make_debug_route => debug, rt, env; p("debug"), end(), g());
    route!(make_list_route => list, rt, env; p(base(&env)), end(), g(), key(&env), query::<q::ShipmentsQuery>());
    route!(make_create_route => create, rt, env; p(base(&env)), end(), post(), key(&env), body::content_length_limit(MAX_CONTENT_LENGTH), body::json());
    route!(make_stats_route => stats, rt, env; p(base(&env)), p("stats"), end(), g(), key(&env), query::<q::ShipmentsQuery>());
    route!(make_random_route => random, rt, env; p(base(&env)), p("random"), end(), g(), key(&env), query::<q::RandomQuery>());
    route!(make_retrieve_route => retrieve, rt, env; p(base(&env)), par::<String>(), end(), g(), key(&env));
    route!(make_update_route => update, rt, env; p(base(&env)), par::<String>(), end(), patch(), key(&env), body::content_length_limit(MAX_CONTENT_LENGTH), body::json());
    route!(make_manual_update_route => update_manual, rt, env; p(base(&env)), par::<String>(), p("manual"), end(), patch(), key(&env), body::content_length_limit(MAX_CONTENT_LENGTH), body::json());
    route!(make_delete_route => delete, rt, env; p(base(&env)), par::<String>(), end(), delete(), key(&env));
    route!(make_add_call_route => add_call, rt, env; p(base(&env)), par::<String>(), p("phone-calls"), end(), post(), key(&env), body::content_length_limit(MAX_CONTENT_LENGTH), body::json());
    route!(make_calls_route => calls, rt, env; p(base(&env)), par::<String>(), p("phone-calls"), end(), g(), key(&env));
    route!(make_clear_calls_route => clear_calls, rt, env; p(base(&env)), par::<String>(), p("phone-calls"), end(), delete(), key(&env));
    route!(make_all_calls_route => all_calls, rt, env; p("phone-calls"), end(), g(), key(&env), query::<q::CallsQuery>());
}
