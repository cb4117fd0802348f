//! Affiche - schedule posters
//!
//! Renders weekly schedules into paginated PNG posters.
//! This library exposes modules for integration testing.

pub mod api;
pub mod assets;
pub mod error;
pub mod layout;
pub mod models;
pub mod rendering;
pub mod server;
pub mod services;
