// src/middlewares/mod.rs

pub mod logging;
pub mod middleware;
