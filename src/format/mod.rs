//! Human-readable counts and dates, in the Korean style the results are
//! usually shown in (`1.5만`, `3일 전`).

use chrono::{DateTime, Utc};

/// `1234567` to `1,234,567`.
pub fn format_number(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// One decimal place, without a trailing `.0`.
fn scaled(n: u64, unit: u64) -> String {
    let s = format!("{:.1}", n as f64 / unit as f64);
    match s.strip_suffix(".0") {
        Some(whole) => whole.to_string(),
        None => s,
    }
}

/// `150000000` to `1.5억`, `12000` to `1.2만`, `999` to `999`.
pub fn format_view_count(n: u64) -> String {
    if n >= 100_000_000 {
        format!("{}억", scaled(n, 100_000_000))
    } else if n >= 10_000 {
        format!("{}만", scaled(n, 10_000))
    } else if n >= 1_000 {
        format!("{}천", scaled(n, 1_000))
    } else {
        n.to_string()
    }
}

/// [format_view_count], counted in people.
pub fn format_subscriber_count(n: u64) -> String {
    format!("{}명", format_view_count(n))
}

/// How long before `now` something was published. Future dates are `오늘`.
pub fn format_relative_time(published: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let days = (now - published).num_days().max(0);
    match days {
        0 => "오늘".to_string(),
        1 => "어제".to_string(),
        2..=6 => format!("{}일 전", days),
        7..=29 => format!("{}주 전", days / 7),
        30..=364 => format!("{}개월 전", days / 30),
        _ => format!("{}년 전", days / 365),
    }
}
