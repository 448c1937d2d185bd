//! SQL construction for the product endpoints.
//!
//! Every statement the service runs is assembled here and nowhere else.
//! Values never enter the SQL text; they travel as positional parameters
//! (`$1..$n`) and are bound by the gateway.

use thiserror::Error;

use crate::db::models::NewProduct;
use crate::models::{ProductFilter, ProductPatch};

const SELECT_PRODUCTS_SQL: &str = "SELECT * FROM products";
const SELECT_PRODUCT_BY_ID_SQL: &str = "SELECT * FROM products WHERE id = $1";
const SEARCH_PRODUCTS_SQL: &str = "SELECT * FROM products \
     WHERE descripcion_corta ILIKE $1 OR descripcion_larga ILIKE $2 \
     ORDER BY id DESC";
const INSERT_PRODUCT_SQL: &str = "INSERT INTO products \
     (descripcion_corta, descripcion_larga, precio, stock, descuento, idrubro, destacado, imagen) \
     VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING id";

#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Int(i32),
    Float(f64),
    Text(String),
}

/// An immutable SQL template together with its ordered parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    sql: String,
    params: Vec<SqlValue>,
}

impl Statement {
    fn new(sql: impl Into<String>, params: Vec<SqlValue>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[SqlValue] {
        &self.params
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("no updatable fields were supplied")]
    NoFields,
}

pub fn insert_product(product: &NewProduct) -> Statement {
    Statement::new(
        INSERT_PRODUCT_SQL,
        vec![
            SqlValue::Text(product.descripcion_corta.clone()),
            SqlValue::Text(product.descripcion_larga.clone()),
            SqlValue::Float(product.precio),
            SqlValue::Int(product.stock),
            SqlValue::Float(product.descuento),
            SqlValue::Int(product.idrubro),
            SqlValue::Int(i32::from(product.destacado)),
            SqlValue::Text(product.imagen.clone()),
        ],
    )
}

/// Builds `UPDATE products SET ... WHERE id = $n` from the supplied fields,
/// in the fixed order precio, stock, descuento, destacado. The id is always
/// the last parameter.
pub fn update_product(id: i32, patch: &ProductPatch) -> Result<Statement, QueryError> {
    let candidates = [
        ("precio", patch.precio.map(SqlValue::Float)),
        ("stock", patch.stock.map(SqlValue::Int)),
        ("descuento", patch.descuento.map(SqlValue::Float)),
        ("destacado", patch.destacado_flag().map(SqlValue::Int)),
    ];

    let mut assignments = Vec::new();
    let mut params = Vec::new();
    for (column, value) in candidates {
        if let Some(value) = value {
            params.push(value);
            assignments.push(format!("{} = ${}", column, params.len()));
        }
    }

    if assignments.is_empty() {
        return Err(QueryError::NoFields);
    }

    params.push(SqlValue::Int(id));
    let sql = format!(
        "UPDATE products SET {} WHERE id = ${}",
        assignments.join(", "),
        params.len()
    );
    Ok(Statement::new(sql, params))
}

/// `SELECT * FROM products` narrowed by category and/or the featured flag.
/// A category name that doesn't resolve is dropped rather than rejected.
pub fn list_products(filter: &ProductFilter) -> Statement {
    let mut conditions = Vec::new();
    let mut params = Vec::new();

    if let Some(rubro) = filter.rubro() {
        params.push(SqlValue::Int(rubro.id()));
        conditions.push(format!("idrubro = ${}", params.len()));
    }

    if filter.only_destacados() {
        conditions.push("destacado = 1".to_string());
    }

    let sql = if conditions.is_empty() {
        SELECT_PRODUCTS_SQL.to_string()
    } else {
        format!("{} WHERE {}", SELECT_PRODUCTS_SQL, conditions.join(" AND "))
    };
    Statement::new(sql, params)
}

/// Case-insensitive substring match on either description.
pub fn search_products(term: &str) -> Statement {
    let pattern = format!("%{}%", term);
    Statement::new(
        SEARCH_PRODUCTS_SQL,
        vec![SqlValue::Text(pattern.clone()), SqlValue::Text(pattern)],
    )
}

pub fn product_by_id(id: i32) -> Statement {
    Statement::new(SELECT_PRODUCT_BY_ID_SQL, vec![SqlValue::Int(id)])
}
