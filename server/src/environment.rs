use std::sync::Arc;

use log::Logger;

use crate::ledger::Ledger;
use crate::urls::Urls;

#[derive(Clone)]
pub struct Environment {
    pub logger: Arc<Logger>,
    pub ledger: Arc<dyn Ledger + Send + Sync>,
    pub urls: Arc<Urls>,
    pub config: Config,
}

impl Environment {
    pub fn new(
        logger: Arc<Logger>,
        ledger: Arc<dyn Ledger + Send + Sync>,
        urls: Arc<Urls>,
        config: Config,
    ) -> Self {
        Self {
            logger,
            ledger,
            urls,
            config,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub(crate) api_key: String,
}

impl Config {
    pub fn new(api_key: String) -> Self {
        Self { api_key }
    }
}
