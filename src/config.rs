use std::net::SocketAddr;

/// Application-level constants
pub const APP_NAME: &str = "Clinicdesk";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable overriding the HTTP bind address.
pub const BIND_ADDR_ENV: &str = "CLINIC_BIND_ADDR";

/// Address used when `CLINIC_BIND_ADDR` is unset or unparseable.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3001";

/// PBKDF2-SHA256 rounds for stored patient credentials.
#[cfg(not(test))]
pub const PASSWORD_HASH_ITERATIONS: u32 = 210_000;

/// Tests register many patients; keep hashing cheap there.
#[cfg(test)]
pub const PASSWORD_HASH_ITERATIONS: u32 = 1_000;

/// Rows kept in the in-memory `audit_log` table; older rows are pruned
/// on every flush.
pub const AUDIT_LOG_RETENTION: usize = 10_000;

/// Default `tracing` filter when `RUST_LOG` is not set.
pub fn default_log_filter() -> String {
    "clinicdesk_lib=info,clinicdesk=info,tower_http=warn".to_string()
}

/// Resolve the HTTP bind address from the environment.
pub fn bind_addr() -> SocketAddr {
    parse_bind_addr(std::env::var(BIND_ADDR_ENV).ok().as_deref())
}

fn parse_bind_addr(raw: Option<&str>) -> SocketAddr {
    let fallback = || {
        DEFAULT_BIND_ADDR
            .parse()
            .unwrap_or_else(|_| SocketAddr::from(([127, 0, 0, 1], 3001)))
    };
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(value) => value.parse().unwrap_or_else(|_| {
            tracing::warn!(value, "Invalid {BIND_ADDR_ENV}, using default");
            fallback()
        }),
        None => fallback(),
    }
}
