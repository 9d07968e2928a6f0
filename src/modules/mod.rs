// src/modules/mod.rs

pub mod api;
pub mod axum;
pub mod docker;
pub mod router;
