//! Shared utilities.
//!
//! - [`errors`]: application error type and HTTP mapping
//! - [`jwt`]: access-token encoding and verification
//! - [`pagination`]: request pagination helpers
//! - [`password`]: password hashing and verification

pub mod errors;
pub mod jwt;
pub mod pagination;
pub mod password;
