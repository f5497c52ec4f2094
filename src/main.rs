// src/main.rs
use actix_web::{App, HttpResponse, HttpServer, middleware, web};
use anyhow::Context;
use log::info;
use std::sync::Arc;

mod catalog;
mod color;
mod config;
mod errors;
mod handlers;
mod models;
mod pipeline;
mod services;
mod session;

use crate::catalog::Catalog;
use crate::config::Config;
use crate::handlers::{
    clear_mockups, convert_color, create_session, dismiss_tutorial, download_archive, get_mockup,
    get_session, get_tutorial, list_products, picker_event, start_generation, toggle_placement,
    upload_logo,
};
use crate::pipeline::MockupGenerator;
use crate::services::{GeminiService, ImageProcessor, RedisService};
use crate::session::ActiveBatches;

#[derive(Clone)]
pub struct AppState {
    redis_service: Arc<RedisService>,
    generator: Arc<dyn MockupGenerator>,
    image_processor: Arc<ImageProcessor>,
    catalog: Arc<Catalog>,
    batches: ActiveBatches,
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    info!("Starting Mockit service...");

    let config = Config::from_env()?;

    let catalog = match &config.catalog_path {
        Some(path) => Catalog::from_json_file(path)
            .with_context(|| format!("loading catalog from {}", path.display()))?,
        None => Catalog::builtin(),
    };
    info!("Catalog has {} products", catalog.products().len());

    // Initialize services
    let redis_service = Arc::new(
        RedisService::new(&config.redis_url, config.session_ttl_secs)
            .await
            .context("connecting to Redis")?,
    );
    let generator: Arc<dyn MockupGenerator> = Arc::new(GeminiService::new(
        config.gemini_api_key.clone(),
        config.gemini_model.clone(),
        config.gemini_base_url.clone(),
    ));
    let image_processor = Arc::new(ImageProcessor::new(config.max_upload_bytes));

    let app_state = AppState {
        redis_service,
        generator,
        image_processor,
        catalog: Arc::new(catalog),
        batches: ActiveBatches::default(),
    };

    let static_dir = config.static_dir.clone().filter(|dir| dir.is_dir());

    info!("Starting HTTP server on {}", config.bind_addr);

    HttpServer::new(move || {
        let mut app = App::new()
            .app_data(web::Data::new(app_state.clone()))
            .wrap(middleware::Logger::default())
            .service(
                web::scope("/api/v1")
                    .route("/products", web::get().to(list_products))
                    .route("/sessions", web::post().to(create_session))
                    .route("/sessions/{session_id}", web::get().to(get_session))
                    .route("/sessions/{session_id}/logo", web::post().to(upload_logo))
                    .route(
                        "/sessions/{session_id}/placements",
                        web::post().to(toggle_placement),
                    )
                    .route(
                        "/sessions/{session_id}/generate",
                        web::post().to(start_generation),
                    )
                    .route(
                        "/sessions/{session_id}/mockups",
                        web::delete().to(clear_mockups),
                    )
                    .route(
                        "/sessions/{session_id}/mockups/{index}",
                        web::get().to(get_mockup),
                    )
                    .route(
                        "/sessions/{session_id}/archive",
                        web::get().to(download_archive),
                    )
                    .route("/tutorial", web::get().to(get_tutorial))
                    .route("/tutorial/dismiss", web::post().to(dismiss_tutorial))
                    .route("/colors/convert", web::post().to(convert_color))
                    .route("/colors/picker", web::post().to(picker_event)),
            )
            .route("/health", web::get().to(health_check));

        if let Some(dir) = &static_dir {
            app = app.service(actix_files::Files::new("/", dir).index_file("index.html"));
        }
        app
    })
    .bind(config.bind_addr.as_str())?
    .run()
    .await?;

    Ok(())
}

async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "mockit",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
