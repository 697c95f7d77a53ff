//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate orderer mutations, persistence and compiles into use-case APIs.
//! - Keep UI/FFI layers decoupled from storage and process details.

pub mod autosave;
pub mod compile_service;
pub mod editor_service;
pub mod section_service;
