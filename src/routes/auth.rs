use actix_files::NamedFile;
use actix_web::http::header;
use actix_web::{web, Either, HttpRequest, HttpResponse};
use serde_json::json;

use crate::error::ApiError;
use crate::models::LoginRequest;
use crate::session::AdminSession;
use crate::state::AppState;

pub const ADMIN_PAGE: &str = "/admin.html";

/// `POST /login`, JSON or urlencoded.
pub async fn login(
    state: web::Data<AppState>,
    body: Either<web::Json<LoginRequest>, web::Form<LoginRequest>>,
) -> Result<HttpResponse, ApiError> {
    let LoginRequest { username, password } = match body {
        Either::Left(json) => json.into_inner(),
        Either::Right(form) => form.into_inner(),
    };

    if !state.admin.verify(&username, &password) {
        log::info!("Inicio de sesión rechazado para el usuario {}", username);
        return Err(ApiError::Unauthorized(
            "Usuario o contraseña incorrectos.".to_string(),
        ));
    }

    let cookie = state.sessions.login()?;
    log::info!("Sesión iniciada para el usuario {}", username);
    Ok(HttpResponse::Ok()
        .cookie(cookie)
        .json(json!({ "success": true, "redirect": ADMIN_PAGE })))
}

/// `GET /logout`
pub async fn logout(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<HttpResponse, ApiError> {
    state.sessions.logout(&req)?;
    Ok(HttpResponse::Found()
        .insert_header((header::LOCATION, "/"))
        .cookie(state.sessions.removal_cookie())
        .finish())
}

/// `GET /admin.html`, only for a logged-in admin.
pub async fn admin_page(
    _admin: AdminSession,
    state: web::Data<AppState>,
) -> actix_web::Result<NamedFile> {
    Ok(NamedFile::open_async(state.public_dir.join("admin.html")).await?)
}
