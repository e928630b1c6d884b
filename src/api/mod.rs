//! HTTP surface

pub mod routes;
pub mod server;
pub mod websocket;

pub use server::*;
