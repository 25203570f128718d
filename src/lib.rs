//! Pointlab - point-wise image processing backend
//!
//! Serves the single-image transform and two-image arithmetic pipelines to an
//! interactive teaching UI. This library exposes modules for integration
//! testing.

pub mod api;
pub mod assets;
pub mod error;
pub mod models;
pub mod rendering;
pub mod server;
pub mod services;
