use sqlx::postgres::PgPoolOptions;

mod models;
mod repositories;
pub mod services;
pub mod settings;
pub mod utils;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    log4rs::init_file("log4rs.yaml", Default::default()).expect("Could not initialize logging.");

    let config = settings::Settings::new().expect("Could not load config file.");
    let conn = PgPoolOptions::new()
        .max_connections(config.postgres.max_connections)
        .connect(&config.postgres.url)
        .await
        .expect("Could not connect to database.");

    log::info!("Starting services.");
    services::start_services(conn, config)
        .await
        .expect("Could not start services.");
}
