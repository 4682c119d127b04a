//! Database models split into domain-specific modules.

pub mod admin;
pub mod member;

pub use admin::*;
pub use member::*;
