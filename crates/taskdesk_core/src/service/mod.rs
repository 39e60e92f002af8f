//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep the presentation layer decoupled from storage details.

pub mod dashboard_service;
pub mod deadline;
pub mod identity_service;
pub mod task_service;
pub mod transcription_service;
