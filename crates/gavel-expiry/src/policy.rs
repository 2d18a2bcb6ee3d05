//! Auction lifetime policy.
//!
//! The lifetime is an operational knob read fresh on every use, so a
//! redeploy-free override takes effect on the next sweep tick. Malformed
//! values degrade to the default rather than failing the caller.

use std::time::Duration;

/// Env var holding the auction lifetime in seconds.
pub const CLOSE_SECONDS_VAR: &str = "AUCTION_CLOSE_SECONDS";

/// Fallback lifetime when the setting is absent or unparseable. Ten seconds
/// keeps tests and interactive runs snappy; a real deployment sets the env
/// var far higher.
pub const DEFAULT_CLOSE_SECONDS: u64 = 10;

/// Resolves the configured auction lifetime.
///
/// Never fails: an unset or non-numeric `AUCTION_CLOSE_SECONDS` yields the
/// default. Cheap enough to call on every sweep tick.
#[must_use]
pub fn auction_duration() -> Duration {
    duration_from(|key| std::env::var(key))
}

/// Core resolution logic, decoupled from the process environment so it can
/// be tested with a pure lookup.
fn duration_from<F>(lookup: F) -> Duration
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let seconds = lookup(CLOSE_SECONDS_VAR)
        .ok()
        .and_then(|raw| raw.trim().parse::<u64>().ok())
        .unwrap_or(DEFAULT_CLOSE_SECONDS);
    Duration::from_secs(seconds)
}
