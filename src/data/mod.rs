// src/data/mod.rs

pub mod aggregator;
pub mod handlers;
pub mod models;
pub mod routes;


pub use models::Sector;
pub use routes::data_routes;
