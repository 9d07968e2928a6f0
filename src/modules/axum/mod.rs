// src/modules/axum/mod.rs

pub mod core;
