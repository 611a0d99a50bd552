use chrono::{SecondsFormat, Utc};

pub const APP_NAME: &str = "spongebook_backend";

/// Fixed-width RFC 3339 in UTC, so timestamps sort lexically.
pub fn now_utc_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn print_banner() {
    println!("{APP_NAME} {}", env!("CARGO_PKG_VERSION"));
}
