use crate::error::PortfolioError;
use crate::replay::apply_to_positions;
use core_types::{Position, TradeRecord, TradeSide};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The state of one trading account: cash, open positions, and the
/// append-only ledger of executed trades. The position map and cash balance
/// are always exactly what a full replay of `(starting_cash, ledger)` would
/// produce; callers that cache this struct recompute it on any mismatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub account_id: String,
    /// The cash balance before any trade in the ledger was applied.
    pub starting_cash: Decimal,
    pub cash: Decimal,
    pub positions: HashMap<String, Position>,
    pub ledger: Vec<TradeRecord>,
}

impl Account {
    /// Creates an empty account with a given amount of starting capital.
    pub fn new(account_id: impl Into<String>, starting_cash: Decimal) -> Self {
        Self {
            account_id: account_id.into(),
            starting_cash,
            cash: starting_cash,
            positions: HashMap::new(),
            ledger: Vec::new(),
        }
    }

    /// Applies an already-validated trade to the account: cash moves, the
    /// ledger grows by one record, and the position map takes the incremental
    /// step. Returns the realized P&L for sells.
    ///
    /// All checks run before the first mutation, so an error leaves the
    /// account untouched.
    pub fn apply_trade(
        &mut self,
        trade: TradeRecord,
    ) -> Result<Option<Decimal>, PortfolioError> {
        let notional = Decimal::from(trade.quantity)
            .checked_mul(trade.price)
            .ok_or_else(|| PortfolioError::Overflow(trade.symbol.clone()))?;

        let realized = match trade.side {
            TradeSide::Buy => {
                if notional > self.cash {
                    return Err(PortfolioError::InsufficientCash {
                        required: notional.to_string(),
                        available: self.cash.to_string(),
                    });
                }
                // A buy cannot fail the position step once funded.
                let realized = apply_to_positions(&mut self.positions, &trade)?;
                self.cash -= notional;
                realized
            }
            TradeSide::Sell => {
                // Both failure points come before the first mutation: the new
                // cash balance is computed up front, and the position step
                // carries all sell pre-checks.
                let new_cash = self
                    .cash
                    .checked_add(notional)
                    .ok_or_else(|| PortfolioError::Overflow(trade.symbol.clone()))?;
                let realized = apply_to_positions(&mut self.positions, &trade)?;
                self.cash = new_cash;
                realized
            }
        };

        tracing::debug!(
            account_id = %self.account_id,
            side = %trade.side,
            symbol = %trade.symbol,
            quantity = trade.quantity,
            price = %trade.price,
            cash = %self.cash,
            "trade applied to account"
        );
        self.ledger.push(trade);
        Ok(realized)
    }

    /// Rebuilds an account from scratch by replaying a ledger in order.
    /// This is the authoritative derivation; the incremental path must agree
    /// with it at every prefix.
    pub fn replay(
        account_id: impl Into<String>,
        starting_cash: Decimal,
        trades: Vec<TradeRecord>,
    ) -> Result<Self, PortfolioError> {
        let mut account = Account::new(account_id, starting_cash);
        for trade in trades {
            account.apply_trade(trade)?;
        }
        Ok(account)
    }

    pub fn position(&self, symbol: &str) -> Option<&Position> {
        self.positions.get(&symbol.to_uppercase())
    }

    /// All open positions, ordered by symbol for stable display.
    pub fn positions_sorted(&self) -> Vec<Position> {
        let mut positions: Vec<Position> = self.positions.values().cloned().collect();
        positions.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        positions
    }

    /// The most recent trades first, up to `limit`.
    pub fn history(&self, limit: usize) -> Vec<TradeRecord> {
        self.ledger.iter().rev().take(limit).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replay::compute_positions;
    use rust_decimal_macros::dec;

    fn trade(symbol: &str, side: TradeSide, quantity: u64, price: Decimal) -> TradeRecord {
        TradeRecord::new(symbol, side, quantity, price).unwrap()
    }

    fn funded_account() -> Account {
        Account::new("test", dec!(10000))
    }

    #[test]
    fn buys_build_a_weighted_average() {
        let mut account = funded_account();
        account
            .apply_trade(trade("AAPL", TradeSide::Buy, 10, dec!(100)))
            .unwrap();
        account
            .apply_trade(trade("AAPL", TradeSide::Buy, 10, dec!(200)))
            .unwrap();

        let position = account.position("AAPL").unwrap();
        assert_eq!(position.quantity, 20);
        assert_eq!(position.average_price, dec!(150));
        assert_eq!(account.cash, dec!(7000));
    }

    #[test]
    fn selling_does_not_move_the_average() {
        let mut account = funded_account();
        account
            .apply_trade(trade("AAPL", TradeSide::Buy, 10, dec!(100)))
            .unwrap();
        account
            .apply_trade(trade("AAPL", TradeSide::Buy, 10, dec!(200)))
            .unwrap();

        let realized = account
            .apply_trade(trade("AAPL", TradeSide::Sell, 5, dec!(300)))
            .unwrap();

        let position = account.position("AAPL").unwrap();
        assert_eq!(position.quantity, 15);
        assert_eq!(position.average_price, dec!(150));
        assert_eq!(realized, Some(dec!(750)));
    }

    #[test]
    fn full_liquidation_removes_the_position() {
        let mut account = funded_account();
        account
            .apply_trade(trade("AAPL", TradeSide::Buy, 10, dec!(100)))
            .unwrap();
        account
            .apply_trade(trade("AAPL", TradeSide::Sell, 10, dec!(90)))
            .unwrap();

        assert!(account.position("AAPL").is_none());
        assert!(account.positions_sorted().is_empty());
    }

    #[test]
    fn cash_is_conserved_across_a_trade_sequence() {
        let mut account = funded_account();
        let trades = vec![
            trade("AAPL", TradeSide::Buy, 10, dec!(101.50)),
            trade("MSFT", TradeSide::Buy, 4, dec!(310.25)),
            trade("AAPL", TradeSide::Sell, 6, dec!(110.75)),
            trade("MSFT", TradeSide::Sell, 4, dec!(290)),
        ];

        let mut expected = dec!(10000);
        for t in trades {
            match t.side {
                TradeSide::Buy => expected -= t.notional(),
                TradeSide::Sell => expected += t.notional(),
            }
            account.apply_trade(t).unwrap();
        }

        assert_eq!(account.cash, expected);
    }

    #[test]
    fn insufficient_cash_leaves_account_untouched() {
        let mut account = Account::new("test", dec!(100));
        let before = account.clone();

        let err = account
            .apply_trade(trade("AAPL", TradeSide::Buy, 10, dec!(50)))
            .unwrap_err();

        assert!(matches!(err, PortfolioError::InsufficientCash { .. }));
        assert_eq!(account, before);
    }

    #[test]
    fn overselling_leaves_account_untouched() {
        let mut account = funded_account();
        account
            .apply_trade(trade("AAPL", TradeSide::Buy, 5, dec!(100)))
            .unwrap();
        let before = account.clone();

        let err = account
            .apply_trade(trade("AAPL", TradeSide::Sell, 6, dec!(100)))
            .unwrap_err();

        assert!(matches!(err, PortfolioError::Oversold { held: 5, .. }));
        assert_eq!(account, before);
    }

    #[test]
    fn incremental_application_matches_full_replay() {
        let trades = vec![
            trade("AAPL", TradeSide::Buy, 10, dec!(100)),
            trade("MSFT", TradeSide::Buy, 3, dec!(333.33)),
            trade("AAPL", TradeSide::Buy, 7, dec!(123.45)),
            trade("AAPL", TradeSide::Sell, 12, dec!(130)),
            trade("MSFT", TradeSide::Sell, 3, dec!(340.10)),
            trade("GOOG", TradeSide::Buy, 2, dec!(2500)),
        ];

        // Incrementally, checking every prefix against a fresh full replay.
        let mut incremental = HashMap::new();
        for (i, t) in trades.iter().enumerate() {
            apply_to_positions(&mut incremental, t).unwrap();
            let replayed = compute_positions(&trades[..=i]).unwrap();
            assert_eq!(incremental, replayed, "diverged after trade {i}");
        }
    }

    #[test]
    fn replay_is_idempotent() {
        let trades = vec![
            trade("AAPL", TradeSide::Buy, 10, dec!(100)),
            trade("AAPL", TradeSide::Buy, 3, dec!(107.77)),
            trade("AAPL", TradeSide::Sell, 5, dec!(120)),
        ];

        let first = Account::replay("test", dec!(10000), trades.clone()).unwrap();
        let second = Account::replay("test", dec!(10000), trades).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn overflowing_position_cost_is_an_error_not_a_panic() {
        let mut positions = HashMap::new();
        apply_to_positions(
            &mut positions,
            &trade("AAPL", TradeSide::Buy, 1, Decimal::MAX),
        )
        .unwrap();

        // Folding a second maximal fill into the average overflows Decimal.
        let err = apply_to_positions(
            &mut positions,
            &trade("AAPL", TradeSide::Buy, 1, Decimal::MAX),
        )
        .unwrap_err();

        assert!(matches!(err, PortfolioError::Overflow(_)));
        // The failed fill left the position as it was.
        assert_eq!(positions.get("AAPL").unwrap().quantity, 1);
    }

    #[test]
    fn replay_rejects_an_inconsistent_ledger() {
        let trades = vec![trade("AAPL", TradeSide::Sell, 1, dec!(100))];
        let err = Account::replay("test", dec!(10000), trades).unwrap_err();
        assert!(matches!(err, PortfolioError::MissingPosition(_)));
    }
}
