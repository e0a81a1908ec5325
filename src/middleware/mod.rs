//! Request-processing middleware.
//!
//! - [`gate`]: the per-request public/protected gate and bearer extraction
//! - [`auth`]: role authorizer (extractors and router layers)
//!
//! # Flow
//!
//! 1. The gate classifies the path; public requests pass untouched.
//! 2. Protected requests must present `Authorization: Bearer <token>`; the
//!    decoded claims are attached to the request extensions.
//! 3. Handlers and router layers enforce role allow-lists through
//!    [`auth::authorize`], receiving the claims via [`auth::AuthUser`].

pub mod auth;
pub mod gate;
