#![allow(dead_code)]

use std::path::Path;
use std::sync::{Arc, Mutex};

use actix_web::web;
use catalog_backend::db::query::Statement;
use catalog_backend::db::{DbError, Gateway, Product};
use catalog_backend::images::ImageStore;
use catalog_backend::session::{sha256_hex, AdminCredentials, SessionStore};
use catalog_backend::AppState;
use diesel::result::{DatabaseErrorKind, Error as DieselError};

pub const BOUNDARY: &str = "----catalogtestboundary";
pub const ADMIN_PASSWORD: &str = "admin123";

/// In-memory gateway that records every statement and answers with canned
/// results.
#[derive(Default)]
pub struct RecordingGateway {
    statements: Mutex<Vec<Statement>>,
    products: Vec<Product>,
    insert_id: i32,
    affected: usize,
    fail: bool,
}

impl RecordingGateway {
    pub fn with_products(products: Vec<Product>) -> Self {
        Self {
            products,
            ..Default::default()
        }
    }

    pub fn with_insert_id(id: i32) -> Self {
        Self {
            insert_id: id,
            ..Default::default()
        }
    }

    pub fn with_affected(affected: usize) -> Self {
        Self {
            affected,
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn statements(&self) -> Vec<Statement> {
        self.statements.lock().unwrap().clone()
    }

    fn record(&self, stmt: &Statement) -> Result<(), DbError> {
        self.statements.lock().unwrap().push(stmt.clone());
        if self.fail {
            return Err(DbError::Query(DieselError::DatabaseError(
                DatabaseErrorKind::Unknown,
                Box::new("connection reset by peer".to_string()),
            )));
        }
        Ok(())
    }
}

impl Gateway for RecordingGateway {
    fn load_products(&self, stmt: &Statement) -> Result<Vec<Product>, DbError> {
        self.record(stmt)?;
        Ok(self.products.clone())
    }

    fn insert_returning_id(&self, stmt: &Statement) -> Result<i32, DbError> {
        self.record(stmt)?;
        Ok(self.insert_id)
    }

    fn execute(&self, stmt: &Statement) -> Result<usize, DbError> {
        self.record(stmt)?;
        Ok(self.affected)
    }
}

pub fn app_state(
    gateway: Arc<RecordingGateway>,
    image_dir: &Path,
    public_dir: &Path,
) -> web::Data<AppState> {
    web::Data::new(AppState {
        gateway,
        images: ImageStore::new(image_dir),
        sessions: SessionStore::new("a test secret that is long enough", false),
        admin: AdminCredentials::new("admin", &sha256_hex(ADMIN_PASSWORD)),
        public_dir: public_dir.to_path_buf(),
    })
}

pub fn sample_products() -> Vec<Product> {
    vec![
        Product {
            id: 2,
            descripcion_corta: "Remera básica".to_string(),
            descripcion_larga: "Remera de algodón peinado".to_string(),
            precio: 12999.0,
            stock: 10,
            descuento: 0.0,
            idrubro: 1,
            destacado: 1,
            imagen: "1700000000000-remera.jpg".to_string(),
        },
        Product {
            id: 1,
            descripcion_corta: "Buzo kids".to_string(),
            descripcion_larga: "Buzo con capucha para chicos".to_string(),
            precio: 18500.5,
            stock: 0,
            descuento: 15.0,
            idrubro: 4,
            destacado: 0,
            imagen: "default.jpg".to_string(),
        },
    ]
}

/// Builds a `multipart/form-data` body with text fields and an optional
/// `imagen` file part.
pub fn multipart_body(fields: &[(&str, &str)], file: Option<(&str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }
    if let Some((filename, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"imagen\"; filename=\"{}\"\r\nContent-Type: image/jpeg\r\n\r\n",
                BOUNDARY, filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={}", BOUNDARY)
}

pub fn product_fields() -> Vec<(&'static str, &'static str)> {
    vec![
        ("descripcionCorta", "Remera"),
        ("descripcionLarga", "Remera de algodón"),
        ("precio", "12999.5"),
        ("stock", "3"),
        ("descuento", "10"),
        ("idrubro", "2"),
        ("destacado", "true"),
    ]
}
