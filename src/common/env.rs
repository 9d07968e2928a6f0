// src/common/env.rs

use dotenvy::dotenv;
use lazy_static::lazy_static;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

const DEFAULT_SOCKET_PATH: &str = "/var/run/docker.sock";

// Holds all configuration variables for the application.
pub struct Config {
    pub port: u16,
    pub bind_address: String,
    pub socket_path: PathBuf,
    pub docker_timeout_secs: u64,
    pub require_daemon: bool,
    pub static_dir: PathBuf,
    pub log_level: String,
}

impl Config {
    fn from_env() -> Self {
        dotenv().ok();
        Config {
            port: parse_or("PORT", 3000),
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0".to_string()),
            socket_path: env::var("DOCKER_SOCKET_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_SOCKET_PATH)),
            docker_timeout_secs: parse_or("DOCKER_TIMEOUT_SECS", 30),
            require_daemon: env::var("REQUIRE_DAEMON")
                .map(|v| parse_flag(&v))
                .unwrap_or(false),
            static_dir: env::var("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("public")),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        }
    }
}

// Invalid values fall back to the default instead of aborting startup.
fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

// Use lazy_static to create a globally accessible, read-only CONFIG instance.
lazy_static! {
    pub static ref CONFIG: Config = Config::from_env();
}

pub fn load() {
    let _ = &CONFIG.port;
}
