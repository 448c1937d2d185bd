use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::query_builder::BoxedSqlQuery;
use diesel::sql_types::{Double, Integer, Text};
use diesel::sql_query;
use thiserror::Error;

use crate::db::connection::PgPool;
use crate::db::models::{InsertedId, Product};
use crate::db::query::{SqlValue, Statement};

#[derive(Debug, Error)]
pub enum DbError {
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),
    #[error("query failed: {0}")]
    Query(#[from] diesel::result::Error),
    #[error("blocking task failed: {0}")]
    Blocking(#[from] actix_web::error::BlockingError),
}

/// Executes statements built by [`crate::db::query`]. Implementations block;
/// handlers call them from `web::block`.
pub trait Gateway: Send + Sync {
    fn load_products(&self, stmt: &Statement) -> Result<Vec<Product>, DbError>;

    /// Runs an `INSERT ... RETURNING id` and yields the generated id.
    fn insert_returning_id(&self, stmt: &Statement) -> Result<i32, DbError>;

    /// Runs a write and yields the number of affected rows.
    fn execute(&self, stmt: &Statement) -> Result<usize, DbError>;
}

pub struct PgGateway {
    pool: PgPool,
}

impl PgGateway {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn bind(stmt: &Statement) -> BoxedSqlQuery<'static, Pg, diesel::query_builder::SqlQuery> {
    let mut query = sql_query(stmt.sql()).into_boxed::<Pg>();
    for value in stmt.params() {
        query = match value.clone() {
            SqlValue::Int(v) => query.bind::<Integer, _>(v),
            SqlValue::Float(v) => query.bind::<Double, _>(v),
            SqlValue::Text(v) => query.bind::<Text, _>(v),
        };
    }
    query
}

impl Gateway for PgGateway {
    fn load_products(&self, stmt: &Statement) -> Result<Vec<Product>, DbError> {
        let conn = &mut self.pool.get()?;
        Ok(bind(stmt).load::<Product>(conn)?)
    }

    fn insert_returning_id(&self, stmt: &Statement) -> Result<i32, DbError> {
        let conn = &mut self.pool.get()?;
        let row = bind(stmt).get_result::<InsertedId>(conn)?;
        Ok(row.id)
    }

    fn execute(&self, stmt: &Statement) -> Result<usize, DbError> {
        let conn = &mut self.pool.get()?;
        Ok(bind(stmt).execute(conn)?)
    }
}
