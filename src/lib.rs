//! Product catalog backend: product CRUD over PostgreSQL, image uploads and a
//! single admin session.

pub mod db;
pub mod error;
pub mod images;
pub mod models;
pub mod routes;
pub mod session;
pub mod settings;
pub mod state;

pub use error::{ApiError, JsonError};
pub use routes::configure;
pub use settings::Settings;
pub use state::AppState;
