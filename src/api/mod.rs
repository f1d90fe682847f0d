//! API Module
//!
//! HTTP handlers and routing for the JSON API the dashboard talks to.
//!
//! # Endpoints
//! - `GET /reports` - List a guild's reports
//! - `POST /aggregate` - Aggregate the logs of selected reports
//! - `GET /stats` - Cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
