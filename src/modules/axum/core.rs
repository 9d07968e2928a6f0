// src/modules/axum/core.rs

use crate::common::env::CONFIG;
use crate::common::log;
use crate::core::state::AppState;
use crate::modules::router::entrance::app_router;
use std::net::IpAddr;
use tokio::net::TcpListener;

const DISPLAY_LIMIT: usize = 2;

// Starts the Axum web server and serves until Ctrl-C.
pub async fn start(state: AppState) {
    let app = app_router(state);
    let port = CONFIG.port;
    let addr = format!("{}:{}", CONFIG.bind_address, port);

    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            log::error(&format!("✗ Failed to bind to address {}: {}", addr, e));
            return;
        }
    };

    log::info(&format!("✓ Listening on http://localhost:{}", port));
    if CONFIG.bind_address == "0.0.0.0" || CONFIG.bind_address == "::" {
        log_interface_urls(port);
    }
    log::info("✓ Ready to handle requests");

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        log::error(&format!("✗ Axum server error: {}", e));
    }
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        log::info("➜ Shutting down");
    }
}

fn url_for(ip: &IpAddr, port: u16) -> String {
    match ip {
        IpAddr::V4(ip) => format!("http://{}:{}", ip, port),
        IpAddr::V6(ip) => format!("http://[{}]:{}", ip, port),
    }
}

// Private ranges first, IPv6 last.
fn priority(ip: &IpAddr) -> u8 {
    match ip {
        IpAddr::V4(v4) => match v4.octets() {
            [192, 168, ..] => 0,
            [100, ..] => 1,
            [10, ..] => 2,
            _ => 3,
        },
        IpAddr::V6(_) => 4,
    }
}

fn log_interface_urls(port: u16) {
    let mut ips: Vec<IpAddr> = get_if_addrs::get_if_addrs()
        .map(|interfaces| {
            interfaces
                .into_iter()
                .map(|iface| iface.addr.ip())
                .filter(|ip| !ip.is_loopback())
                .collect()
        })
        .unwrap_or_default();
    ips.sort_by_key(|ip| (priority(ip), ip.to_string()));

    let shown = DISPLAY_LIMIT.min(ips.len());
    let more = ips.len() - shown;
    for (index, ip) in ips[..shown].iter().enumerate() {
        let mut line = format!("✓ Listening on {}", url_for(ip, port));
        if index == shown - 1 && more > 0 {
            line.push_str(&format!(" +{} more", more));
        }
        log::info(&line);
    }
    for ip in &ips[shown..] {
        log::debug(&format!("➜ Listening on {}", url_for(ip, port)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    #[test]
    fn private_ranges_sort_first() {
        let mut ips = vec![
            IpAddr::V6(Ipv6Addr::new(0xfe80, 0, 0, 0, 0, 0, 0, 1)),
            IpAddr::V4(Ipv4Addr::new(10, 0, 0, 5)),
            IpAddr::V4(Ipv4Addr::new(192, 168, 1, 20)),
            IpAddr::V4(Ipv4Addr::new(100, 64, 0, 1)),
        ];
        ips.sort_by_key(|ip| (priority(ip), ip.to_string()));
        assert_eq!(ips[0], IpAddr::V4(Ipv4Addr::new(192, 168, 1, 20)));
        assert_eq!(ips[1], IpAddr::V4(Ipv4Addr::new(100, 64, 0, 1)));
        assert!(ips[3].is_ipv6());
    }

    #[test]
    fn ipv6_urls_are_bracketed() {
        let ip = IpAddr::V6(Ipv6Addr::LOCALHOST);
        assert_eq!(url_for(&ip, 3000), "http://[::1]:3000");
    }
}
