//! Conversion between the platform's ISO-8601 interval notation (`PT1H2M3S`),
//! whole seconds, and clock strings for display.
//!
//! Parsing never fails: anything unreadable is a zero-length video.

use lazy_static::lazy_static;
use regex::Regex;

/// Videos shorter than this are "short"; everything else is "long".
pub const SHORT_VIDEO_SECS: u64 = 240;

/// Total seconds in an interval string of the form `PT[nH][nM][nS]`.
pub fn parse_duration(code: &str) -> u64 {
    lazy_static! {
        static ref INTERVAL: Regex = Regex::new(r"PT(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?").unwrap();
    }

    let caps = match INTERVAL.captures(code) {
        Some(caps) => caps,
        None => return 0,
    };
    let component = |i: usize| -> u64 {
        caps.get(i)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0)
    };

    component(1)
        .saturating_mul(3600)
        .saturating_add(component(2).saturating_mul(60))
        .saturating_add(component(3))
}

/// `H:MM:SS` when there is at least an hour, `M:SS` otherwise.
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}
