use actix_web::web;

use crate::error::ApiError;

pub mod auth;
pub mod products;

/// Registers every API route. Static file services are mounted separately so
/// they can act as the catch-all.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        ApiError::validation(format!("Cuerpo JSON inválido: {}", err)).into()
    }))
    .app_data(web::FormConfig::default().error_handler(|err, _req| {
        ApiError::validation(format!("Formulario inválido: {}", err)).into()
    }))
    .route("/guardar_producto", web::post().to(products::create_product))
    .route("/productos/buscar", web::get().to(products::search_products))
    .route("/productos", web::get().to(products::list_products))
    .route("/productos/{id}", web::get().to(products::get_product))
    .route("/productos/{id}", web::put().to(products::update_product))
    .route("/login", web::post().to(auth::login))
    .route("/logout", web::get().to(auth::logout))
    .route(auth::ADMIN_PAGE, web::get().to(auth::admin_page));
}
