use rust_decimal::Decimal;

use crate::types::{AccountState, Candidate, SizeAction, SizingDecision};

/// Pure percent-of-equity sizing with a minimum-notional floor. Notional-based
/// on purpose: resolving shares against a live price is the brokerage's job,
/// which keeps this component free of market-data dependencies.
pub struct PercentOfEquitySizer {
    percent_per_trade: Decimal,
    min_order_notional: Decimal,
}

impl PercentOfEquitySizer {
    pub fn new(percent_per_trade: Decimal, min_order_notional: Decimal) -> Self {
        Self {
            percent_per_trade,
            min_order_notional,
        }
    }

    pub fn size(&self, candidate: &Candidate, account: &AccountState) -> SizingDecision {
        if candidate.symbol.trim().is_empty() {
            return SizingDecision {
                symbol: candidate.symbol.clone(),
                action: SizeAction::SkipNoCandidate,
                notional: Decimal::ZERO,
                quantity: None,
            };
        }
        let target = account.equity * self.percent_per_trade / Decimal::ONE_HUNDRED;
        let action = if target < self.min_order_notional {
            SizeAction::SkipBelowMinNotional
        } else {
            SizeAction::Submit
        };
        SizingDecision {
            symbol: candidate.symbol.clone(),
            action,
            // Kept on skips too, for audit visibility
            notional: target,
            quantity: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn candidate(symbol: &str) -> Candidate {
        Candidate {
            symbol: symbol.to_string(),
            score: None,
        }
    }

    fn account(equity: Decimal) -> AccountState {
        AccountState {
            equity,
            buying_power: equity,
        }
    }

    #[test]
    fn sizes_exactly_percent_of_equity() {
        let sizer = PercentOfEquitySizer::new(dec!(5.0), dec!(1.00));
        let decision = sizer.size(&candidate("AAPL"), &account(dec!(10000)));
        assert_eq!(decision.action, SizeAction::Submit);
        assert_eq!(decision.notional, dec!(500.00));
        assert_eq!(decision.quantity, None);
    }

    #[test]
    fn skips_below_the_minimum_notional() {
        let sizer = PercentOfEquitySizer::new(dec!(5.0), dec!(1.00));
        let decision = sizer.size(&candidate("AAPL"), &account(dec!(15)));
        assert_eq!(decision.action, SizeAction::SkipBelowMinNotional);
        // The undersized target is still reported
        assert_eq!(decision.notional, dec!(0.75));
    }

    #[test]
    fn target_equal_to_the_floor_submits() {
        let sizer = PercentOfEquitySizer::new(dec!(5.0), dec!(1.00));
        let decision = sizer.size(&candidate("AAPL"), &account(dec!(20)));
        assert_eq!(decision.action, SizeAction::Submit);
        assert_eq!(decision.notional, dec!(1.00));
    }

    #[test]
    fn blank_symbol_is_skipped_without_sizing() {
        let sizer = PercentOfEquitySizer::new(dec!(5.0), dec!(1.00));
        let decision = sizer.size(&candidate("  "), &account(dec!(10000)));
        assert_eq!(decision.action, SizeAction::SkipNoCandidate);
        assert_eq!(decision.notional, Decimal::ZERO);
    }

    #[test]
    fn arithmetic_is_exact_decimal() {
        let sizer = PercentOfEquitySizer::new(dec!(0.1), dec!(0));
        let decision = sizer.size(&candidate("AAPL"), &account(dec!(123456.78)));
        assert_eq!(decision.notional, dec!(123.45678));
    }

    #[test]
    fn sizing_is_idempotent() {
        let sizer = PercentOfEquitySizer::new(dec!(5.0), dec!(1.00));
        let first = sizer.size(&candidate("MSFT"), &account(dec!(9999.99)));
        let second = sizer.size(&candidate("MSFT"), &account(dec!(9999.99)));
        assert_eq!(first, second);
    }
}
