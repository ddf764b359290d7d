use actix_web::{middleware, web, App, HttpServer};
use log::info;

use todomvc_backend_rs::config::AppConfig;
use todomvc_backend_rs::db::connect_db;
use todomvc_backend_rs::response::json_error_handler;
use todomvc_backend_rs::routes::{cors, tag, todo};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();
    let config = AppConfig::from_env();
    let db = connect_db(&config).await;
    let server_port = config.server_port;

    let server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(db.clone()))
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .wrap(middleware::Logger::default())
            .wrap(actix_web::middleware::from_fn(cors::cors_handler))
            .configure(todo::config)
            .configure(tag::config)
    })
    .bind(("0.0.0.0", server_port))?;
    info!("server started at http://0.0.0.0:{}", server_port);
    server.run().await
}
