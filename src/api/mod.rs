//! HTTP surface
//!
//! JSON endpoints for sessions, rounds and verification on top of
//! [`SessionRoundManager`](crate::session::SessionRoundManager).

pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod server;

pub use handlers::AppState;
pub use server::{build_app, ApiServer, ServerSettings};
