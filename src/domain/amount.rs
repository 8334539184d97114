//! Token amount and time rendering.
//!
//! On-chain amounts are integers with 18 implied decimals. Alerts show
//! them truncated to 4 decimal places, so a raw value is first divided
//! down to units of 0.0001 and then lifted into a `Decimal` with scale 4.

use chrono::DateTime;
use rust_decimal::Decimal;

use super::auction::UnixSeconds;

/// Implied decimals of the auction token.
pub const TOKEN_DECIMALS: u32 = 18;

/// Decimal places shown in alerts.
pub const DISPLAY_DECIMALS: u32 = 4;

/// Convert a raw 18-decimal amount into a 4-decimal `Decimal` (truncated).
///
/// `u128::MAX / 10^14` is about 3.4e24, well inside the 96-bit mantissa,
/// so the conversion cannot overflow.
pub fn token_amount(raw: u128) -> Decimal {
    let units = raw / 10u128.pow(TOKEN_DECIMALS - DISPLAY_DECIMALS);
    i128::try_from(units)
        .ok()
        .and_then(|u| Decimal::try_from_i128_with_scale(u, DISPLAY_DECIMALS).ok())
        .unwrap_or(Decimal::MAX)
}

/// Render a raw 18-decimal amount, e.g. `1500000000000000000` → `1.5000`.
pub fn format_token_amount(raw: u128) -> String {
    token_amount(raw).to_string()
}

/// Render a unix timestamp as `YYYY-MM-DD HH:MM:SS UTC`.
///
/// Out-of-range timestamps fall back to the raw number.
pub fn format_end_time(ts: UnixSeconds) -> String {
    DateTime::from_timestamp(ts, 0).map_or_else(
        || ts.to_string(),
        |dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}

/// Whole minutes from `now` until `end_time`, floored and never negative.
pub const fn whole_minutes_until(end_time: UnixSeconds, now: UnixSeconds) -> i64 {
    let remaining = end_time.saturating_sub(now);
    if remaining <= 0 { 0 } else { remaining / 60 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_token_amount_truncates_to_four_places() {
        // 1.23456789 tokens
        assert_eq!(token_amount(1_234_567_890_000_000_000), dec!(1.2345));
        assert_eq!(format_token_amount(1_500_000_000_000_000_000), "1.5000");
    }

    #[test]
    fn test_token_amount_dust_is_zero() {
        assert_eq!(format_token_amount(99_999_999_999_999), "0.0000");
        assert_eq!(format_token_amount(0), "0.0000");
    }

    #[test]
    fn test_token_amount_large_values() {
        assert_eq!(
            format_token_amount(1_000_000 * 10u128.pow(18)),
            "1000000.0000"
        );
        // u128::MAX must not panic
        assert!(!format_token_amount(u128::MAX).is_empty());
    }

    #[test]
    fn test_format_end_time_utc() {
        assert_eq!(format_end_time(0), "1970-01-01 00:00:00 UTC");
        assert_eq!(format_end_time(1_700_000_000), "2023-11-14 22:13:20 UTC");
    }

    #[test]
    fn test_whole_minutes_until_floors_and_clamps() {
        assert_eq!(whole_minutes_until(1_000 + 3_000, 1_000), 50);
        assert_eq!(whole_minutes_until(1_000 + 119, 1_000), 1);
        assert_eq!(whole_minutes_until(1_000 + 59, 1_000), 0);
        assert_eq!(whole_minutes_until(500, 1_000), 0);
    }
}
