use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::db::schema::products;

/// Image name stored when a product is created without an upload.
pub const DEFAULT_IMAGE: &str = "default.jpg";

#[derive(Queryable, QueryableByName, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[diesel(table_name = products)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i32,
    pub descripcion_corta: String,
    pub descripcion_larga: String,
    pub precio: f64,
    pub stock: i32,
    pub descuento: f64,
    pub idrubro: i32,
    pub destacado: i32,
    pub imagen: String,
}

/// Fully coerced create payload. `imagen` is either a stored upload or
/// [`DEFAULT_IMAGE`].
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub descripcion_corta: String,
    pub descripcion_larga: String,
    pub precio: f64,
    pub stock: i32,
    pub descuento: f64,
    pub idrubro: i32,
    pub destacado: bool,
    pub imagen: String,
}

#[derive(QueryableByName, Debug)]
pub struct InsertedId {
    #[diesel(sql_type = diesel::sql_types::Integer)]
    pub id: i32,
}
