// src/chat/mod.rs

pub mod handlers;
pub mod routes;


pub use routes::chat_routes;
