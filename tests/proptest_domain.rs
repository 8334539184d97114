//! Property-Based Tests - Domain Layer Invariants
//!
//! Uses `proptest` to verify that the closing-window selection and the
//! amount rendering hold their invariants across random inputs.

use std::collections::BTreeMap;

use proptest::prelude::*;

use leviathan_auction_bot::domain::amount::{format_token_amount, whole_minutes_until};
use leviathan_auction_bot::domain::closing::{closing_soon, in_closing_window};
use leviathan_auction_bot::domain::messages::escape_html;

const NOW: i64 = 1_700_000_000;

// ── Closing Window Properties ───────────────────────────────

proptest! {
    /// Every selected entry is inside the window, every skipped one outside.
    #[test]
    fn closing_soon_partitions_watchlist(
        entries in prop::collection::btree_map(0u64..10_000, -20_000i64..20_000, 0..64),
        window in 1i64..10_000,
    ) {
        let watchlist: BTreeMap<u64, i64> =
            entries.into_iter().map(|(id, offset)| (id, NOW + offset)).collect();

        let due = closing_soon(&watchlist, NOW, window);
        let due_ids: Vec<u64> = due.iter().map(|d| d.auction_id).collect();

        for (id, end) in &watchlist {
            let remaining = end - NOW;
            let expected = remaining > 0 && remaining <= window;
            prop_assert_eq!(due_ids.contains(id), expected, "id {} remaining {}", id, remaining);
        }
        prop_assert!(due_ids.windows(2).all(|w| w[0] < w[1]), "ids must ascend");
    }

    /// Minutes left are floored and bounded by the window.
    #[test]
    fn minutes_left_floor_and_bound(remaining in 1i64..=7_200) {
        prop_assert!(in_closing_window(NOW + remaining, NOW, 7_200));
        let minutes = whole_minutes_until(NOW + remaining, NOW);
        prop_assert!(minutes * 60 <= remaining);
        prop_assert!(remaining < (minutes + 1) * 60);
        prop_assert!(minutes <= 120);
    }

    /// Past deadlines never yield negative minutes.
    #[test]
    fn past_deadline_is_zero_minutes(elapsed in 0i64..1_000_000) {
        prop_assert_eq!(whole_minutes_until(NOW - elapsed, NOW), 0);
        prop_assert!(!in_closing_window(NOW - elapsed, NOW, 7_200));
    }
}

// ── Rendering Properties ────────────────────────────────────

proptest! {
    /// Rendering truncates to exactly four decimals, never rounds.
    #[test]
    fn token_amount_truncates(raw in any::<u64>(), scale in 0u32..6) {
        let raw = u128::from(raw) * 10u128.pow(scale);
        let rendered = format_token_amount(raw);

        let (_, frac) = rendered.split_once('.').expect("four decimals");
        prop_assert_eq!(frac.len(), 4);

        let digits: u128 = rendered.replace('.', "").parse().unwrap();
        prop_assert_eq!(digits, raw / 10u128.pow(14));
    }

    /// Escaped text never contains raw markup characters.
    #[test]
    fn escaped_text_has_no_markup(raw in ".*") {
        let escaped = escape_html(&raw);
        prop_assert!(!escaped.contains('<'));
        prop_assert!(!escaped.contains('>'));
    }
}
