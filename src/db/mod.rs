pub mod connection;
pub mod gateway;
pub mod models;
pub mod query;
pub mod schema;

pub use connection::*;
pub use gateway::*;
pub use models::*;
