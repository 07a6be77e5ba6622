#[macro_use]
extern crate rocket;

mod api;
mod config;
mod models;
mod services;
mod utils;

use anyhow::Result;
use rocket::{Build, Rocket};
use services::record_source::RecordSource;
use std::sync::Arc;

pub struct AppState {
    pub record_source: Arc<dyn RecordSource>,
}

pub fn build_rocket(state: AppState) -> Result<Rocket<Build>> {
    let cors = config::create_cors()?;

    Ok(rocket::build()
        .manage(state)
        .mount(
            "/api",
            routes![
                api::query_videos,
                api::query_videos_post,
                api::get_dashboard,
                api::health,
            ],
        )
        .attach(cors))
}

#[rocket::main]
async fn main() -> Result<()> {
    config::load_environment();
    config::init_logger();

    let state = config::create_app_state()?;
    build_rocket(state)?.launch().await?;

    Ok(())
}
