// src/sessions/mod.rs

pub mod handlers;
pub mod routes;

#[cfg(test)]
mod tests;

pub use routes::sessions_routes;
