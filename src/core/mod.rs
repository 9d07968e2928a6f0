// src/core/mod.rs

pub mod bootstrap;
pub mod error;
pub mod response;
pub mod state;
