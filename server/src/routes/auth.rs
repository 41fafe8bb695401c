use warp::{reject, Filter};

use super::rejection::{Context, Rejection};
use crate::errors::BackendError;

/// The header carrying the shared credential.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Requires the shared API key on the request. Health and debug
/// introspection are the only routes assembled without this filter.
pub fn require_api_key(
    expected: String,
) -> impl Filter<Extract = (), Error = reject::Rejection> + Clone {
    warp::header::optional::<String>(API_KEY_HEADER)
        .and_then(move |provided: Option<String>| {
            let expected = expected.clone();

            async move {
                match provided {
                    Some(ref key) if *key == expected => Ok(()),
                    _ => Err(Rejection::reject(Context::auth(), BackendError::InvalidApiKey)),
                }
            }
        })
        .untuple_one()
}
