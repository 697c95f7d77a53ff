//! FFI crate for the résumé editor UI.
//!
//! All exported functions live in `api`; core types never cross the boundary.

pub mod api;
