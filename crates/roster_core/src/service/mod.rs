//! Record services.
//!
//! # Responsibility
//! - Classify gateway outcomes into caller-facing results.
//! - Keep API layers decoupled from storage details.

pub mod student_service;
