mod insert;
mod models;
mod open;
mod query;
mod schema;

pub mod export;

pub use models::*;
pub use open::Db;
