use std::env;

use url::Url;

/// Fallback seconds-per-call assigned when a load is agreed through the
/// API path without an operator-entered figure. A provisional business
/// guess carried over from historical reporting, not a measured value.
pub const DEFAULT_API_SECONDS_PER_CALL: f64 = 120.0;

/// Fallback seconds-per-call for loads agreed through the manual path.
/// Same caveat as [`DEFAULT_API_SECONDS_PER_CALL`].
pub const DEFAULT_MANUAL_SECONDS_PER_CALL: f64 = 300.0;

/// Returns the value of the named environment variable if it exists or panics.
pub fn get_variable(name: &str) -> String {
    env::var(name).unwrap_or_else(|_| panic!("must define {} environment variable", name))
}

/// Returns the value of the named environment variable, or the fallback.
pub fn get_variable_or(name: &str, fallback: &str) -> String {
    env::var(name).unwrap_or_else(|_| fallback.to_owned())
}

/// Reads the CORS origin list from `BACKEND_ALLOWED_ORIGINS`. `None`
/// means any origin. Each entry must parse as a URL; a bad entry aborts
/// startup rather than silently opening the API up.
pub fn get_allowed_origins() -> Option<Vec<String>> {
    let raw = get_variable_or("BACKEND_ALLOWED_ORIGINS", "*");

    if raw.trim() == "*" {
        return None;
    }

    let origins = raw
        .split(',')
        .map(|origin| {
            let origin = origin.trim();
            Url::parse(origin)
                .unwrap_or_else(|_| panic!("parse allowed origin {} as URL", origin));
            origin.to_owned()
        })
        .collect();

    Some(origins)
}
