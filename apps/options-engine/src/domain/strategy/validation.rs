//! Leg-template validators, one per strategy kind.
//!
//! Each validator takes legs in any order, checks them against the template and
//! returns the variant payload with legs in canonical order. Nothing is coerced:
//! a leg combination that does not match is rejected.

use super::{Butterfly, IronCondor, Straddle, Strangle, Strategy, StrategyKind, VerticalSpread};
use crate::domain::contract::OptionType;
use crate::domain::errors::ValidationError;
use crate::domain::leg::{Leg, LegDirection};

/// Checks shared by all templates: leg count, one underlying, one expiration.
pub fn validate_common(kind: StrategyKind, legs: &[Leg]) -> Result<(), ValidationError> {
    if legs.len() != kind.leg_count() {
        return Err(ValidationError::LegCount {
            kind,
            expected: kind.leg_count(),
            actual: legs.len(),
        });
    }

    let Some(first) = legs.first() else {
        return Ok(());
    };
    let symbol = first.contract().symbol();
    let expiration = first.contract().expiration();

    if let Some(other) = legs.iter().find(|l| l.contract().symbol() != symbol) {
        return Err(ValidationError::MixedLegs {
            message: format!("found {} and {}", symbol, other.contract().symbol()),
        });
    }
    if let Some(other) = legs.iter().find(|l| l.contract().expiration() != expiration) {
        return Err(ValidationError::MixedLegs {
            message: format!("found {} and {}", expiration, other.contract().expiration()),
        });
    }
    Ok(())
}

/// Remove the single leg matching `option_type` and `direction`.
fn take_leg(
    kind: StrategyKind,
    legs: &mut Vec<Leg>,
    option_type: OptionType,
    direction: LegDirection,
) -> Result<Leg, ValidationError> {
    let matches: Vec<usize> = legs
        .iter()
        .enumerate()
        .filter(|(_, l)| l.contract().option_type() == option_type && l.direction() == direction)
        .map(|(i, _)| i)
        .collect();

    match matches.as_slice() {
        [index] => Ok(legs.swap_remove(*index)),
        other => Err(ValidationError::LegTemplate {
            kind,
            message: format!(
                "expected exactly one {direction} {option_type}, found {}",
                other.len()
            ),
        }),
    }
}

/// Remove the single leg of `option_type`, whatever its direction.
fn take_type(
    kind: StrategyKind,
    legs: &mut Vec<Leg>,
    option_type: OptionType,
) -> Result<Leg, ValidationError> {
    let matches: Vec<usize> = legs
        .iter()
        .enumerate()
        .filter(|(_, l)| l.contract().option_type() == option_type)
        .map(|(i, _)| i)
        .collect();

    match matches.as_slice() {
        [index] => Ok(legs.swap_remove(*index)),
        other => Err(ValidationError::LegTemplate {
            kind,
            message: format!("expected exactly one {option_type}, found {}", other.len()),
        }),
    }
}

fn equal_quantities(kind: StrategyKind, legs: &[&Leg]) -> Result<(), ValidationError> {
    let Some(first) = legs.first() else {
        return Ok(());
    };
    if legs.iter().any(|l| l.quantity() != first.quantity()) {
        let quantities: Vec<u32> = legs.iter().map(|l| l.quantity()).collect();
        return Err(ValidationError::QuantityMismatch {
            kind,
            message: format!("all legs must have equal quantity, got {quantities:?}"),
        });
    }
    Ok(())
}

/// Long put < short put < short call < long call, equal quantities.
pub(super) fn iron_condor(mut legs: Vec<Leg>) -> Result<IronCondor, ValidationError> {
    let kind = StrategyKind::IronCondor;
    let long_put = take_leg(kind, &mut legs, OptionType::Put, LegDirection::Long)?;
    let short_put = take_leg(kind, &mut legs, OptionType::Put, LegDirection::Short)?;
    let short_call = take_leg(kind, &mut legs, OptionType::Call, LegDirection::Short)?;
    let long_call = take_leg(kind, &mut legs, OptionType::Call, LegDirection::Long)?;

    let strikes = [
        long_put.strike(),
        short_put.strike(),
        short_call.strike(),
        long_call.strike(),
    ];
    if !strikes.windows(2).all(|w| w[0] < w[1]) {
        return Err(ValidationError::StrikeOrdering {
            kind,
            message: format!(
                "need long put < short put < short call < long call, got {strikes:?}"
            ),
        });
    }
    equal_quantities(kind, &[&long_put, &short_put, &short_call, &long_call])?;

    Ok(IronCondor {
        legs: [long_put, short_put, short_call, long_call],
    })
}

/// Call and put, same strike, same direction, equal quantity.
pub(super) fn straddle(mut legs: Vec<Leg>) -> Result<Straddle, ValidationError> {
    let kind = StrategyKind::Straddle;
    let call = take_type(kind, &mut legs, OptionType::Call)?;
    let put = take_type(kind, &mut legs, OptionType::Put)?;

    if call.strike() != put.strike() {
        return Err(ValidationError::StrikeOrdering {
            kind,
            message: format!(
                "call and put must share a strike, got {} and {}",
                call.strike(),
                put.strike()
            ),
        });
    }
    same_direction(kind, &call, &put)?;
    equal_quantities(kind, &[&call, &put])?;

    Ok(Straddle { legs: [call, put] })
}

/// Call and put, same direction, put strike below call strike.
pub(super) fn strangle(mut legs: Vec<Leg>) -> Result<Strangle, ValidationError> {
    let kind = StrategyKind::Strangle;
    let call = take_type(kind, &mut legs, OptionType::Call)?;
    let put = take_type(kind, &mut legs, OptionType::Put)?;

    if put.strike() >= call.strike() {
        return Err(ValidationError::StrikeOrdering {
            kind,
            message: format!(
                "put strike {} must be below call strike {}",
                put.strike(),
                call.strike()
            ),
        });
    }
    same_direction(kind, &call, &put)?;
    equal_quantities(kind, &[&call, &put])?;

    Ok(Strangle { legs: [put, call] })
}

fn same_direction(kind: StrategyKind, a: &Leg, b: &Leg) -> Result<(), ValidationError> {
    if a.direction() != b.direction() {
        return Err(ValidationError::LegTemplate {
            kind,
            message: "call and put must have the same direction".to_string(),
        });
    }
    Ok(())
}

/// One long and one short leg of `option_type` at distinct strikes.
pub(super) fn vertical(
    kind: StrategyKind,
    option_type: OptionType,
    mut legs: Vec<Leg>,
) -> Result<VerticalSpread, ValidationError> {
    let long = take_leg(kind, &mut legs, option_type, LegDirection::Long)?;
    let short = take_leg(kind, &mut legs, option_type, LegDirection::Short)?;

    if long.strike() == short.strike() {
        return Err(ValidationError::StrikeOrdering {
            kind,
            message: format!("legs must have distinct strikes, both at {}", long.strike()),
        });
    }
    equal_quantities(kind, &[&long, &short])?;

    Ok(VerticalSpread {
        legs: [long, short],
    })
}

/// Three legs of one type; wings share direction and quantity q, body is opposite with 2q.
pub(super) fn butterfly(mut legs: Vec<Leg>) -> Result<Butterfly, ValidationError> {
    let kind = StrategyKind::Butterfly;
    let option_type = legs
        .first()
        .map_or(OptionType::Call, |l| l.contract().option_type());
    if legs.iter().any(|l| l.contract().option_type() != option_type) {
        return Err(ValidationError::LegTemplate {
            kind,
            message: "all legs must be the same option type".to_string(),
        });
    }

    legs.sort_by(|a, b| a.strike().total_cmp(&b.strike()));
    let [lower, body, upper]: [Leg; 3] = legs.try_into().map_err(|v: Vec<Leg>| {
        ValidationError::LegCount {
            kind,
            expected: 3,
            actual: v.len(),
        }
    })?;

    if !(lower.strike() < body.strike() && body.strike() < upper.strike()) {
        return Err(ValidationError::StrikeOrdering {
            kind,
            message: format!(
                "need three distinct strikes, got {}, {}, {}",
                lower.strike(),
                body.strike(),
                upper.strike()
            ),
        });
    }
    if lower.direction() != upper.direction() || body.direction() != lower.direction().opposite() {
        return Err(ValidationError::LegTemplate {
            kind,
            message: "wings must share a direction opposite to the body".to_string(),
        });
    }
    if lower.quantity() != upper.quantity() || body.quantity() != 2 * lower.quantity() {
        return Err(ValidationError::QuantityMismatch {
            kind,
            message: format!(
                "need wing:body:wing of q:2q:q, got {}:{}:{}",
                lower.quantity(),
                body.quantity(),
                upper.quantity()
            ),
        });
    }

    Ok(Butterfly {
        legs: [lower, body, upper],
    })
}

/// Underlying position checks that need a price.
///
/// Iron condors require the underlying between the short strikes.
pub(super) fn underlying_in_range(strategy: &Strategy, spot: f64) -> Result<(), ValidationError> {
    match strategy {
        Strategy::IronCondor(ic) => {
            let (low, high) = (ic.short_put().strike(), ic.short_call().strike());
            if spot > low && spot < high {
                Ok(())
            } else {
                Err(ValidationError::UnderlyingOutOfRange {
                    kind: StrategyKind::IronCondor,
                    spot,
                    message: format!("put strikes < underlying < call strikes ({low} < S < {high})"),
                })
            }
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::contract::OptionContract;
    use chrono::NaiveDate;
    use test_case::test_case;

    fn leg(kind: OptionType, strike: f64, direction: LegDirection, quantity: u32) -> Leg {
        let exp = NaiveDate::from_ymd_opt(2025, 2, 21).unwrap();
        let contract = OptionContract::new("SPY", strike, exp, kind, 1.0, 0.2).unwrap();
        Leg::new(contract, direction, quantity).unwrap()
    }

    use LegDirection::{Long, Short};
    use OptionType::{Call, Put};

    #[test]
    fn test_condor_wrong_count() {
        let legs = vec![leg(Put, 140.0, Long, 1), leg(Put, 145.0, Short, 1)];
        let err = Strategy::from_legs(StrategyKind::IronCondor, legs).unwrap_err();
        assert!(matches!(err, ValidationError::LegCount { actual: 2, .. }));
    }

    #[test]
    fn test_condor_crossed_strikes() {
        let legs = vec![
            leg(Put, 140.0, Long, 1),
            leg(Put, 156.0, Short, 1),
            leg(Call, 155.0, Short, 1),
            leg(Call, 160.0, Long, 1),
        ];
        let err = Strategy::from_legs(StrategyKind::IronCondor, legs).unwrap_err();
        assert!(matches!(err, ValidationError::StrikeOrdering { .. }));
    }

    #[test]
    fn test_condor_long_wing_inside_rejected() {
        let legs = vec![
            leg(Put, 146.0, Long, 1),
            leg(Put, 145.0, Short, 1),
            leg(Call, 155.0, Short, 1),
            leg(Call, 160.0, Long, 1),
        ];
        assert!(Strategy::from_legs(StrategyKind::IronCondor, legs).is_err());
    }

    #[test]
    fn test_condor_two_short_puts_rejected() {
        let legs = vec![
            leg(Put, 140.0, Short, 1),
            leg(Put, 145.0, Short, 1),
            leg(Call, 155.0, Short, 1),
            leg(Call, 160.0, Long, 1),
        ];
        let err = Strategy::from_legs(StrategyKind::IronCondor, legs).unwrap_err();
        assert!(matches!(err, ValidationError::LegTemplate { .. }), "{err}");
    }

    #[test]
    fn test_condor_unequal_quantity() {
        let legs = vec![
            leg(Put, 140.0, Long, 2),
            leg(Put, 145.0, Short, 1),
            leg(Call, 155.0, Short, 1),
            leg(Call, 160.0, Long, 1),
        ];
        let err = Strategy::from_legs(StrategyKind::IronCondor, legs).unwrap_err();
        assert!(matches!(err, ValidationError::QuantityMismatch { .. }));
    }

    #[test]
    fn test_mixed_symbols_rejected() {
        let exp = NaiveDate::from_ymd_opt(2025, 2, 21).unwrap();
        let qqq = OptionContract::new("QQQ", 100.0, exp, Put, 1.0, 0.2).unwrap();
        let legs = vec![leg(Call, 100.0, Long, 1), Leg::long(qqq)];
        let err = Strategy::from_legs(StrategyKind::Straddle, legs).unwrap_err();
        assert!(matches!(err, ValidationError::MixedLegs { .. }));
    }

    #[test_case(100.0, 100.0, Long, Long, true ; "long straddle")]
    #[test_case(100.0, 100.0, Short, Short, true ; "short straddle")]
    #[test_case(100.0, 105.0, Long, Long, false ; "different strikes")]
    #[test_case(100.0, 100.0, Long, Short, false ; "mixed direction")]
    fn test_straddle(call_k: f64, put_k: f64, call_d: LegDirection, put_d: LegDirection, ok: bool) {
        let legs = vec![leg(Call, call_k, call_d, 1), leg(Put, put_k, put_d, 1)];
        assert_eq!(Strategy::from_legs(StrategyKind::Straddle, legs).is_ok(), ok);
    }

    #[test_case(95.0, 105.0, true ; "otm strangle")]
    #[test_case(105.0, 95.0, false ; "inverted")]
    #[test_case(100.0, 100.0, false ; "same strike")]
    fn test_strangle(put_k: f64, call_k: f64, ok: bool) {
        let legs = vec![leg(Call, call_k, Short, 1), leg(Put, put_k, Short, 1)];
        assert_eq!(Strategy::from_legs(StrategyKind::Strangle, legs).is_ok(), ok);
    }

    #[test]
    fn test_vertical_spreads() {
        let bull_call = vec![leg(Call, 100.0, Long, 1), leg(Call, 105.0, Short, 1)];
        let Ok(Strategy::CallSpread(spread)) =
            Strategy::from_legs(StrategyKind::CallSpread, bull_call)
        else {
            panic!("expected call spread");
        };
        assert_eq!(spread.width(), 5.0);

        let bear_put = vec![leg(Put, 105.0, Long, 1), leg(Put, 100.0, Short, 1)];
        assert!(Strategy::from_legs(StrategyKind::PutSpread, bear_put).is_ok());

        let wrong_type = vec![leg(Put, 100.0, Long, 1), leg(Put, 105.0, Short, 1)];
        assert!(Strategy::from_legs(StrategyKind::CallSpread, wrong_type).is_err());

        let same_strike = vec![leg(Call, 100.0, Long, 1), leg(Call, 100.0, Short, 1)];
        assert!(Strategy::from_legs(StrategyKind::CallSpread, same_strike).is_err());
    }

    #[test]
    fn test_butterfly() {
        let legs = vec![
            leg(Call, 110.0, Long, 1),
            leg(Call, 100.0, Long, 1),
            leg(Call, 105.0, Short, 2),
        ];
        let Ok(Strategy::Butterfly(fly)) = Strategy::from_legs(StrategyKind::Butterfly, legs) else {
            panic!("expected butterfly");
        };
        assert_eq!(fly.lower().strike(), 100.0);
        assert_eq!(fly.body().quantity(), 2);
        assert_eq!(fly.upper().strike(), 110.0);
    }

    #[test]
    fn test_butterfly_bad_ratio() {
        let legs = vec![
            leg(Put, 100.0, Long, 1),
            leg(Put, 105.0, Short, 1),
            leg(Put, 110.0, Long, 1),
        ];
        let err = Strategy::from_legs(StrategyKind::Butterfly, legs).unwrap_err();
        assert!(matches!(err, ValidationError::QuantityMismatch { .. }));
    }

    #[test]
    fn test_butterfly_mixed_types() {
        let legs = vec![
            leg(Put, 100.0, Long, 1),
            leg(Call, 105.0, Short, 2),
            leg(Put, 110.0, Long, 1),
        ];
        assert!(Strategy::from_legs(StrategyKind::Butterfly, legs).is_err());
    }

    #[test_case(150.0, true)]
    #[test_case(145.0, false)]
    #[test_case(160.0, false)]
    fn test_condor_underlying_range(spot: f64, ok: bool) {
        let legs = vec![
            leg(Put, 140.0, Long, 1),
            leg(Put, 145.0, Short, 1),
            leg(Call, 155.0, Short, 1),
            leg(Call, 160.0, Long, 1),
        ];
        let ic = Strategy::from_legs(StrategyKind::IronCondor, legs).unwrap();
        assert_eq!(underlying_in_range(&ic, spot).is_ok(), ok);
    }
}
