//! Webhook source authentication.
//!
//! When a webhook secret is configured, Telegram echoes it back in the
//! `X-Telegram-Bot-Api-Secret-Token` header and that header alone decides
//! access. Without a secret the fallback is a source-IP check against the
//! egress ranges Telegram publishes for webhook traffic.

use std::net::{IpAddr, Ipv4Addr};

use axum::http::HeaderMap;
use secrecy::{ExposeSecret, SecretString};

const SECRET_TOKEN_HEADER: &str = "x-telegram-bot-api-secret-token";
const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";
const REAL_IP_HEADER: &str = "x-real-ip";

/// Published Telegram webhook egress ranges, as (network, prefix length).
const TELEGRAM_RANGES: [(Ipv4Addr, u8); 2] = [
    (Ipv4Addr::new(149, 154, 160, 0), 20),
    (Ipv4Addr::new(91, 108, 4, 0), 22),
];

pub fn is_authentic(
    headers: &HeaderMap,
    peer: IpAddr,
    webhook_secret: Option<&SecretString>,
) -> bool {
    if let Some(secret) = webhook_secret {
        let presented = headers.get(SECRET_TOKEN_HEADER).and_then(|value| value.to_str().ok());
        return presented == Some(secret.expose_secret());
    }

    match client_ip(headers, peer) {
        Some(ip) => is_telegram_ip(ip),
        None => false,
    }
}

/// Resolves the originating address behind a reverse proxy. A forwarding
/// header that is present but unparseable yields `None` so the caller
/// denies instead of falling back to the proxy address.
fn client_ip(headers: &HeaderMap, peer: IpAddr) -> Option<IpAddr> {
    let forwarded = headers
        .get(FORWARDED_FOR_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty());
    if let Some(list) = forwarded {
        if let Some(first) = list.split(',').next() {
            return first.trim().parse().ok();
        }
    }

    let real_ip = headers
        .get(REAL_IP_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty());
    if let Some(value) = real_ip {
        return value.parse().ok();
    }

    Some(peer)
}

fn is_telegram_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => TELEGRAM_RANGES
            .iter()
            .any(|(network, prefix)| in_network(v4, *network, *prefix)),
        IpAddr::V6(_) => false,
    }
}

fn in_network(ip: Ipv4Addr, network: Ipv4Addr, prefix: u8) -> bool {
    let mask = u32::MAX << (32 - u32::from(prefix));
    (u32::from(ip) & mask) == (u32::from(network) & mask)
}
