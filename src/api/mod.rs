//! HTTP/WebSocket surface: REST projections of round state plus the
//! real-time game protocol.

pub mod errors;
pub mod events;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod monitoring;
pub mod routes;
pub mod server;
pub mod websocket;
