use serde::Serialize;
use warp::reject;

use crate::errors::BackendError;

#[derive(Debug)]
pub struct Rejection {
    pub(crate) context: Context,
    pub(crate) error: BackendError,
}

impl Rejection {
    pub fn new(context: Context, error: BackendError) -> Self {
        Rejection { context, error }
    }

    /// Wraps straight into a warp rejection, ready for `?`.
    pub fn reject(context: Context, error: BackendError) -> reject::Rejection {
        reject::custom(Rejection::new(context, error))
    }

    pub fn flatten(&self) -> FlattenedRejection {
        FlattenedRejection {
            context: self.context.clone(),
            message: format!("{}", self.error),
        }
    }
}

impl reject::Reject for Rejection {}

#[derive(Debug, Serialize)]
pub struct FlattenedRejection {
    #[serde(flatten)]
    pub(crate) context: Context,
    pub(crate) message: String,
}

/// Which operation failed, with the identifying detail it was given.
#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum Context {
    AddCall { identifier: String },
    AllCalls {},
    Auth {},
    Calls { identifier: String },
    ClearCalls { identifier: String },
    Create { load_id: String },
    Debug {},
    Delete { identifier: String },
    List {},
    Random { origin: Option<String> },
    Retrieve { identifier: String },
    Stats {},
    Update { identifier: String },
}

impl Context {
    pub fn add_call(identifier: String) -> Context {
        Context::AddCall { identifier }
    }

    pub fn all_calls() -> Context {
        Context::AllCalls {}
    }

    pub fn auth() -> Context {
        Context::Auth {}
    }

    pub fn calls(identifier: String) -> Context {
        Context::Calls { identifier }
    }

    pub fn clear_calls(identifier: String) -> Context {
        Context::ClearCalls { identifier }
    }

    pub fn create(load_id: String) -> Context {
        Context::Create { load_id }
    }

    pub fn debug() -> Context {
        Context::Debug {}
    }

    pub fn delete(identifier: String) -> Context {
        Context::Delete { identifier }
    }

    pub fn list() -> Context {
        Context::List {}
    }

    pub fn random(origin: Option<String>) -> Context {
        Context::Random { origin }
    }

    pub fn retrieve(identifier: String) -> Context {
        Context::Retrieve { identifier }
    }

    pub fn stats() -> Context {
        Context::Stats {}
    }

    pub fn update(identifier: String) -> Context {
        Context::Update { identifier }
    }
}
