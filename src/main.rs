use std::sync::Arc;

use actix_cors::Cors;
use actix_files::Files;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};

use catalog_backend::db::{init_pool, run_migrations, PgGateway};
use catalog_backend::{configure, AppState, Settings};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(err) => {
            log::error!("Configuración inválida: {}", err);
            std::process::exit(1);
        }
    };

    // Serving traffic against a dead database is worse than not starting.
    let pool = match init_pool(&settings) {
        Ok(pool) => pool,
        Err(err) => {
            log::error!("No se pudo conectar con la base de datos: {}", err);
            std::process::exit(1);
        }
    };
    log::info!("Conectado a la base de datos {}", settings.db_name);

    match run_migrations(&pool) {
        Ok(0) => {}
        Ok(applied) => log::info!("{} migraciones aplicadas", applied),
        Err(err) => {
            log::error!("No se pudieron aplicar las migraciones: {}", err);
            std::process::exit(1);
        }
    }

    let app_state = web::Data::new(AppState::new(Arc::new(PgGateway::new(pool)), &settings));
    app_state.images.ensure_dir().await?;

    let image_dir = settings.image_dir.clone();
    let public_dir = settings.public_dir.clone();
    let bind = settings.bind_address();
    log::info!("Servidor activo en http://{}:{}", bind.0, bind.1);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .wrap(Logger::default())
            .wrap(cors)
            .app_data(app_state.clone())
            .configure(configure)
            .service(Files::new("/imagenes", image_dir.clone()))
            .service(Files::new("/", public_dir.clone()).index_file("index.html"))
    })
    .bind(bind)?
    .run()
    .await
}
