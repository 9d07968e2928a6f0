// src/modules/router/mod.rs

pub mod entrance;
