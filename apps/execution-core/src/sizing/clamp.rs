//! Three-way constraint resolution: exchange floor, risk ceiling,
//! requested size.

use rust_decimal::Decimal;

use super::error::SizingError;
use super::types::{ClampReason, SizingInput, SizingOutcome};

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Clamp a proposed fractional size into a tradable notional.
///
/// Steps, in order:
/// 1. Convert the requested percentage into a notional.
/// 2. Raise it to the exchange minimum-notional floor if below.
/// 3. Lower it to the effective risk ceiling (min of per-asset headroom,
///    tier cap, position-count cap) if above; if even the floor does not
///    fit under the ceiling, reject with the shortfall amount.
///
/// # Errors
///
/// Returns [`SizingError::InvalidInput`] for non-positive account value,
/// negative requested size, or a non-positive exchange floor. An
/// exposure-cap rejection is a normal outcome, not an error.
pub fn clamp(input: &SizingInput) -> Result<SizingOutcome, SizingError> {
    if input.account_value_usd <= Decimal::ZERO {
        return Err(SizingError::InvalidInput(format!(
            "account value {} must be positive",
            input.account_value_usd
        )));
    }
    if input.requested_size_pct < Decimal::ZERO {
        return Err(SizingError::InvalidInput(format!(
            "requested size {}% cannot be negative",
            input.requested_size_pct
        )));
    }
    if input.min_notional_usd <= Decimal::ZERO {
        return Err(SizingError::InvalidInput(format!(
            "min notional {} must be positive",
            input.min_notional_usd
        )));
    }

    let requested_notional = input.requested_size_pct / HUNDRED * input.account_value_usd;
    let ceiling = input
        .per_asset_headroom_usd
        .min(input.tier_cap_usd)
        .min(input.position_count_cap_usd);

    let mut size_pct = input.requested_size_pct;
    let mut clamp = ClampReason::None;

    // Exchange floor: the minimum percentage that clears min notional.
    if requested_notional < input.min_notional_usd {
        size_pct = input.min_notional_usd / input.account_value_usd * HUNDRED;
        clamp = ClampReason::RaisedToMinNotional;
        tracing::debug!(
            requested_pct = %input.requested_size_pct,
            raised_pct = %size_pct,
            min_notional_usd = %input.min_notional_usd,
            "size raised to clear exchange floor"
        );
    }

    let mut notional = size_pct / HUNDRED * input.account_value_usd;

    // Risk ceiling: compare the minimum viable notional against the
    // ceiling before clamping down, so a hopeless request is rejected
    // with its shortfall rather than silently shrunk below the floor.
    if notional > ceiling {
        if input.min_notional_usd > ceiling {
            let shortfall_usd = input.min_notional_usd - ceiling;
            tracing::warn!(
                min_notional_usd = %input.min_notional_usd,
                ceiling_usd = %ceiling,
                shortfall_usd = %shortfall_usd,
                "no valid trade size under exposure cap"
            );
            return Ok(SizingOutcome {
                size_pct: Decimal::ZERO,
                notional_usd: Decimal::ZERO,
                clamp: ClampReason::RejectedExposureCap { shortfall_usd },
                requested_notional_usd: requested_notional,
                ceiling_usd: ceiling,
            });
        }
        notional = ceiling;
        size_pct = ceiling / input.account_value_usd * HUNDRED;
        tracing::debug!(
            ceiling_usd = %ceiling,
            clamped_pct = %size_pct,
            "size lowered to risk ceiling"
        );
    }

    Ok(SizingOutcome {
        size_pct,
        notional_usd: notional,
        clamp,
        requested_notional_usd: requested_notional,
        ceiling_usd: ceiling,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use test_case::test_case;

    fn input() -> SizingInput {
        SizingInput {
            requested_size_pct: dec!(1.4),
            account_value_usd: dec!(256.97),
            per_asset_headroom_usd: dec!(100),
            tier_cap_usd: dec!(100),
            position_count_cap_usd: dec!(100),
            min_notional_usd: dec!(5.00),
        }
    }

    #[test]
    fn raises_to_exchange_floor() {
        // 1.4% of 256.97 = 3.5976 < 5.00, so the size is raised to the
        // minimum percentage that clears the floor.
        let outcome = clamp(&input()).expect("valid input");
        assert_eq!(outcome.clamp, ClampReason::RaisedToMinNotional);
        assert_eq!(outcome.size_pct.round_dp(4), dec!(1.9458));
        assert_eq!(outcome.notional_usd.round_dp(2), dec!(5.00));
        assert_eq!(outcome.requested_notional_usd.round_dp(4), dec!(3.5976));
    }

    #[test]
    fn rejects_when_floor_exceeds_headroom() {
        let mut i = input();
        i.per_asset_headroom_usd = dec!(1.34);
        let outcome = clamp(&i).expect("valid input");
        assert!(outcome.is_rejected());
        assert_eq!(
            outcome.clamp,
            ClampReason::RejectedExposureCap {
                shortfall_usd: dec!(3.66)
            }
        );
        assert_eq!(outcome.notional_usd, Decimal::ZERO);
        assert_eq!(outcome.ceiling_usd, dec!(1.34));
    }

    #[test]
    fn accepts_unconstrained_request() {
        let mut i = input();
        i.requested_size_pct = dec!(10);
        let outcome = clamp(&i).expect("valid input");
        assert_eq!(outcome.clamp, ClampReason::None);
        assert_eq!(outcome.notional_usd.round_dp(3), dec!(25.697));
        assert_eq!(outcome.size_pct, dec!(10));
    }

    // The effective ceiling is the smallest of the three caps.
    #[test_case(dec!(20), dec!(100), dec!(100), dec!(20); "headroom binds")]
    #[test_case(dec!(100), dec!(15), dec!(100), dec!(15); "tier cap binds")]
    #[test_case(dec!(100), dec!(100), dec!(12), dec!(12); "position count binds")]
    fn ceiling_is_min_of_caps(
        headroom: Decimal,
        tier: Decimal,
        positions: Decimal,
        expected: Decimal,
    ) {
        let mut i = input();
        i.requested_size_pct = dec!(50); // 128.485 requested, above every cap
        i.per_asset_headroom_usd = headroom;
        i.tier_cap_usd = tier;
        i.position_count_cap_usd = positions;
        let outcome = clamp(&i).expect("valid input");
        assert_eq!(outcome.clamp, ClampReason::None);
        assert_eq!(outcome.notional_usd, expected);
        assert_eq!(outcome.ceiling_usd, expected);
        // Percentage recomputed from the clamped notional.
        assert_eq!(
            outcome.size_pct.round_dp(6),
            (expected / dec!(256.97) * dec!(100)).round_dp(6)
        );
    }

    #[test]
    fn raised_then_rejected_when_tier_cap_below_floor() {
        let mut i = input();
        i.tier_cap_usd = dec!(2.50);
        let outcome = clamp(&i).expect("valid input");
        assert_eq!(
            outcome.clamp,
            ClampReason::RejectedExposureCap {
                shortfall_usd: dec!(2.50)
            }
        );
    }

    #[test]
    fn zero_request_is_raised_to_floor() {
        let mut i = input();
        i.requested_size_pct = Decimal::ZERO;
        let outcome = clamp(&i).expect("valid input");
        assert_eq!(outcome.clamp, ClampReason::RaisedToMinNotional);
        assert_eq!(outcome.notional_usd.round_dp(2), dec!(5.00));
    }

    #[test]
    fn invalid_account_value_errors() {
        let mut i = input();
        i.account_value_usd = Decimal::ZERO;
        assert!(matches!(clamp(&i), Err(SizingError::InvalidInput(_))));
    }

    #[test]
    fn negative_request_errors() {
        let mut i = input();
        i.requested_size_pct = dec!(-1);
        assert!(matches!(clamp(&i), Err(SizingError::InvalidInput(_))));
    }
}
