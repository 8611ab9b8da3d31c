use actix_web::{middleware, web, App, HttpServer};
use tracing::{error, info};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};
use url::Url;

use place_harvest::api::{download_run, health, run_progress, start_run};
use place_harvest::config::Config;
use place_harvest::places::{PlacesClient, DEFAULT_BASE_URL};
use place_harvest::registry::RunRegistry;
use place_harvest::runner::BatchRunner;
use place_harvest::scheduler::RunScheduler;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Logging
    let _ = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .finish()
        .try_init();

    // Config; a missing API key is fatal before any run can start.
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("configuration error: {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()));
        }
    };

    // Init subsystems
    let base_url = Url::parse(DEFAULT_BASE_URL).expect("default base URL parses");
    let client = PlacesClient::new(base_url, config.api_key.clone())
        .expect("places client init failed");
    let registry = RunRegistry::new();
    let scheduler = RunScheduler::new(config.max_concurrent_runs);
    let runner = BatchRunner::new(
        client,
        registry.clone(),
        scheduler,
        config.output_dir.clone(),
    );

    info!(
        "harvester listening on {} (exports in {:?}, {} concurrent run(s))",
        config.bind_addr, config.output_dir, config.max_concurrent_runs
    );
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(runner.clone()))
            .app_data(web::Data::new(registry.clone()))
            .wrap(middleware::Logger::default())
            .service(health)
            .service(start_run)
            .service(run_progress)
            .service(download_run)
    })
    .bind(config.bind_addr)?
    .workers(2)
    .run()
    .await
}
