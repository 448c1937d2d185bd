use std::collections::HashMap;

use actix_multipart::Multipart;
use actix_web::http::header::ContentType;
use actix_web::{web, HttpResponse};
use futures::StreamExt;

use crate::db::query;
use crate::db::{DbError, NewProduct, DEFAULT_IMAGE};
use crate::error::{ApiError, JsonError};
use crate::images::ImageStore;
use crate::models::{ProductFilter, ProductPatch, SearchQuery};
use crate::state::AppState;

/// Multipart field carrying the product image.
pub const IMAGE_FIELD: &str = "imagen";

const NOT_FOUND_MSG: &str = "Producto no encontrado.";

/// Runs a gateway call on the blocking pool.
async fn blocking<T, F>(f: F) -> Result<T, DbError>
where
    F: FnOnce() -> Result<T, DbError> + Send + 'static,
    T: Send + 'static,
{
    web::block(f).await?
}

fn plain(body: String) -> HttpResponse {
    HttpResponse::Ok()
        .content_type(ContentType::plaintext())
        .body(body)
}

/// Text fields of the create form plus the stored upload, if any.
#[derive(Debug, Default)]
struct ProductForm {
    fields: HashMap<String, String>,
    upload: Option<String>,
}

impl ProductForm {
    /// The value as sent; blank counts as missing.
    fn text(&self, name: &str) -> Result<String, ApiError> {
        self.fields
            .get(name)
            .filter(|v| !v.trim().is_empty())
            .cloned()
            .ok_or_else(|| ApiError::validation(format!("Falta el campo {}.", name)))
    }

    fn number<T: std::str::FromStr>(&self, name: &str) -> Result<T, ApiError> {
        self.text(name)?
            .trim()
            .parse()
            .map_err(|_| invalid_value(name))
    }

    /// Like `number`, but `NaN` and the infinities are rejected.
    fn amount(&self, name: &str) -> Result<f64, ApiError> {
        let value: f64 = self.number(name)?;
        if value.is_finite() {
            Ok(value)
        } else {
            Err(invalid_value(name))
        }
    }

    fn flag(&self, name: &str) -> bool {
        self.fields.get(name).map_or(false, |v| {
            matches!(
                v.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "on" | "yes"
            )
        })
    }

    fn to_new_product(&self) -> Result<NewProduct, ApiError> {
        Ok(NewProduct {
            descripcion_corta: self.text("descripcionCorta")?,
            descripcion_larga: self.text("descripcionLarga")?,
            precio: self.amount("precio")?,
            stock: self.number("stock")?,
            descuento: self.amount("descuento")?,
            idrubro: self.number("idrubro")?,
            destacado: self.flag("destacado"),
            imagen: self
                .upload
                .clone()
                .unwrap_or_else(|| DEFAULT_IMAGE.to_string()),
        })
    }
}

fn invalid_value(name: &str) -> ApiError {
    ApiError::validation(format!("Valor inválido para {}.", name))
}

async fn read_form(
    images: &ImageStore,
    mut payload: Multipart,
    form: &mut ProductForm,
) -> Result<(), ApiError> {
    while let Some(item) = payload.next().await {
        let mut field =
            item.map_err(|e| ApiError::validation(format!("Formulario inválido: {}", e)))?;
        let disposition = field.content_disposition().clone();
        let name = disposition.get_name().unwrap_or_default().to_string();

        if let Some(filename) = disposition.get_filename() {
            if name != IMAGE_FIELD {
                return Err(ApiError::validation(format!(
                    "Campo de archivo inesperado: {}.",
                    name
                )));
            }
            if filename.is_empty() {
                // Browsers send an empty part when no file was chosen.
                while let Some(chunk) = field.next().await {
                    chunk.map_err(|e| ApiError::validation(format!("Formulario inválido: {}", e)))?;
                }
                continue;
            }
            if form.upload.is_some() {
                return Err(ApiError::validation("Solo se admite una imagen por producto."));
            }
            let stored = images
                .save_stream(filename, field)
                .await
                .map_err(|e| ApiError::validation(format!("No se pudo guardar la imagen: {}", e)))?;
            form.upload = Some(stored);
        } else {
            let mut bytes = Vec::new();
            while let Some(chunk) = field.next().await {
                let chunk =
                    chunk.map_err(|e| ApiError::validation(format!("Formulario inválido: {}", e)))?;
                bytes.extend_from_slice(&chunk);
            }
            let value = String::from_utf8(bytes).map_err(|_| invalid_value(&name))?;
            form.fields.insert(name, value);
        }
    }
    Ok(())
}

/// Deletes an image whose product row was never written. Failures are only
/// logged; the response has already been decided.
async fn discard_upload(images: &ImageStore, upload: Option<&str>) {
    if let Some(filename) = upload {
        if let Err(err) = images.remove(filename).await {
            log::error!("Error al eliminar imagen fallida {}: {}", filename, err);
        }
    }
}

/// `POST /guardar_producto`
pub async fn create_product(
    state: web::Data<AppState>,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let mut form = ProductForm::default();
    let product = match read_form(&state.images, payload, &mut form).await {
        Ok(()) => form.to_new_product(),
        Err(err) => Err(err),
    };
    let product = match product {
        Ok(product) => product,
        Err(err) => {
            discard_upload(&state.images, form.upload.as_deref()).await;
            return Err(err);
        }
    };

    let stmt = query::insert_product(&product);
    let gateway = state.gateway.clone();
    match blocking(move || gateway.insert_returning_id(&stmt)).await {
        Ok(id) => {
            log::info!("Producto {} guardado con imagen {}", id, product.imagen);
            Ok(plain(format!("Producto guardado con ID {}", id)))
        }
        Err(err) => {
            let err = ApiError::persistence("Error interno al guardar el producto.", err);
            discard_upload(&state.images, form.upload.as_deref()).await;
            Err(err)
        }
    }
}

/// `PUT /productos/{id}`
pub async fn update_product(
    state: web::Data<AppState>,
    id: web::Path<i32>,
    patch: web::Json<ProductPatch>,
) -> Result<HttpResponse, ApiError> {
    let id = id.into_inner();
    let stmt = query::update_product(id, &patch)?;

    let gateway = state.gateway.clone();
    let affected = blocking(move || gateway.execute(&stmt))
        .await
        .map_err(|e| ApiError::persistence("Error interno del servidor al actualizar.", e))?;

    if affected == 0 {
        return Err(ApiError::not_found(NOT_FOUND_MSG));
    }
    Ok(plain(format!(
        "Producto con ID {} actualizado correctamente.",
        id
    )))
}

/// `GET /productos/buscar?q=`
pub async fn search_products(
    state: web::Data<AppState>,
    params: web::Query<SearchQuery>,
) -> Result<HttpResponse, JsonError> {
    let term = params
        .into_inner()
        .q
        .filter(|q| !q.is_empty())
        .ok_or_else(|| ApiError::validation("Falta el término de búsqueda (parámetro q)."))?;

    let stmt = query::search_products(&term);
    let gateway = state.gateway.clone();
    let products = blocking(move || gateway.load_products(&stmt))
        .await
        .map_err(|e| ApiError::persistence("Error interno del servidor.", e))?;
    Ok(HttpResponse::Ok().json(products))
}

/// `GET /productos?rubro=&destacado=`
pub async fn list_products(
    state: web::Data<AppState>,
    filter: web::Query<ProductFilter>,
) -> Result<HttpResponse, ApiError> {
    let stmt = query::list_products(&filter);
    let gateway = state.gateway.clone();
    let products = blocking(move || gateway.load_products(&stmt))
        .await
        .map_err(|e| ApiError::persistence("Error interno del servidor.", e))?;
    Ok(HttpResponse::Ok().json(products))
}

/// `GET /productos/{id}`
pub async fn get_product(
    state: web::Data<AppState>,
    id: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let stmt = query::product_by_id(id.into_inner());
    let gateway = state.gateway.clone();
    let product = blocking(move || gateway.load_products(&stmt))
        .await
        .map_err(|e| ApiError::persistence("Error interno al buscar el producto.", e))?
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::not_found(NOT_FOUND_MSG))?;
    Ok(HttpResponse::Ok().json(product))
}
