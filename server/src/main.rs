use std::error::Error;
use std::path::Path;
use std::sync::Arc;

use warp::Filter;

use backend::config::{get_allowed_origins, get_variable, get_variable_or};
use backend::environment::{Config, Environment};
use backend::ledger::{Ledger, MemoryLedger};
use backend::routes;
use backend::seed;
use backend::urls::Urls;
use futures::future::FutureExt;
use log::{info, initialize_logger};
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv::dotenv().ok();

    let logger = initialize_logger();

    let main_port: u16 = get_variable("BACKEND_PORT")
        .parse()
        .expect("parse BACKEND_PORT as u16");
    let admin_port: u16 = get_variable("BACKEND_ADMIN_PORT")
        .parse()
        .expect("parse BACKEND_ADMIN_PORT as u16");

    info!(logger, "Starting..."; "main_port" => main_port, "admin_port" => admin_port);
    let logger = Arc::new(logger);

    let ledger: Arc<dyn Ledger + Send + Sync> = Arc::new(MemoryLedger::new());

    let seed_path = get_variable_or("BACKEND_SEED_PATH", "data/seed_shipments.csv");
    let loaded = seed::load_from_path(&logger, ledger.as_ref(), Path::new(&seed_path)).await;
    info!(logger, "Startup data load complete"; "shipments" => loaded);

    let urls = Arc::new(Urls::new(
        get_variable("BACKEND_BASE_URL"),
        get_variable_or("BACKEND_SHIPMENTS_PATH", "shipments"),
    ));

    let config = Config::new(get_variable("BACKEND_API_KEY"));
    let environment = Environment::new(logger.clone(), ledger, urls, config);

    let (termination_sender, mut termination_receiver) = mpsc::channel::<()>(1);

    let terminate = Arc::new(move || {
        let termination_sender = termination_sender.clone();

        async move {
            let termination_sender = termination_sender.clone();
            termination_sender.send(()).await.unwrap();
        }
        .boxed()
    });

    let should_terminate = async move {
        termination_receiver.recv().await;
    }
    .shared();

    let ctrlc = {
        let should_terminate = should_terminate.clone();
        let terminate = terminate.clone();

        let signal = tokio::signal::ctrl_c();

        async move {
            let terminate = terminate.clone();

            tokio::select! {
                _ = should_terminate => {},
                _ = signal => {
                    terminate().await;
                }
            }
        }
    };

    let main_server = {
        let should_terminate = should_terminate.clone();

        let cors = {
            let builder = warp::cors()
                .allow_methods(vec!["GET", "POST", "PATCH", "DELETE"])
                .allow_headers(vec!["content-type", "x-api-key"]);

            match get_allowed_origins() {
                None => builder.allow_any_origin().build(),
                Some(origins) => builder
                    .allow_origins(origins.iter().map(|origin| origin.as_str()))
                    .build(),
            }
        };

        let routes = routes::make_api(environment.clone()).with(cors);

        let (_, main_server) =
            warp::serve(routes).bind_with_graceful_shutdown(([0, 0, 0, 0], main_port), async {
                should_terminate.await;
            });

        main_server
    };

    let admin_server = {
        let should_terminate = should_terminate.clone();
        let terminate = terminate.clone();

        let routes = routes::admin::make_healthz_route(environment.clone()).or(
            routes::admin::make_termination_route(environment.clone(), terminate),
        );

        let (_, admin_server) =
            warp::serve(routes).bind_with_graceful_shutdown(([0, 0, 0, 0], admin_port), async {
                should_terminate.await;
            });

        admin_server
    };

    tokio::join!(ctrlc, main_server, admin_server);

    info!(logger, "Exiting gracefully...");

    Ok(())
}
