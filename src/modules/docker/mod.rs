// src/modules/docker/mod.rs

pub mod client;
pub mod dispatch;
pub mod inventory;
pub mod logs;
pub mod normalize;
pub mod raw;
pub mod stats;
pub mod unix;

#[cfg(test)]
pub mod fake;
