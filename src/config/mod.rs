//! Environment-driven configuration.
//!
//! Each submodule loads one concern from environment variables during
//! startup. Nothing here is read per-request; the loaded structs are
//! assembled into [`crate::state::AppState`] once.
//!
//! - [`cors`]: allowed origins for the CORS layer
//! - [`database`]: PostgreSQL pool initialization (`DATABASE_URL`)
//! - [`gate`]: deployment mode and extra public paths for the request gate
//! - [`jwt`]: signing secret and token lifetimes (`JWT_SECRET_KEY` required)

pub mod cors;
pub mod database;
pub mod gate;
pub mod jwt;
