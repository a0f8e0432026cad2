use portfolio::Account;
use rust_decimal::Decimal;
use std::fmt;
use store::AccountSnapshot;

/// A description of how a cached snapshot disagrees with what ledger replay
/// actually produces. Divergence is a bug signal: it is logged and counted,
/// then recovered from by adopting the replayed state.
#[derive(Debug, Clone, PartialEq)]
pub struct Divergence {
    /// `(cached, replayed)` cash values, when they differ.
    pub cash: Option<(Decimal, Decimal)>,
    /// Symbols whose cached position differs from the replayed one (missing,
    /// extra, or mismatched quantity/average).
    pub symbols: Vec<String>,
}

impl fmt::Display for Divergence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some((cached, replayed)) = self.cash {
            write!(f, "cash cached={cached} replayed={replayed}; ")?;
        }
        write!(f, "symbols: {}", self.symbols.join(", "))
    }
}

/// Compares a cached snapshot against a freshly replayed account. Returns
/// `None` when the cache is faithful.
pub fn diff_snapshot(replayed: &Account, cached: &AccountSnapshot) -> Option<Divergence> {
    let mut symbols = Vec::new();

    let cash = if cached.cash != replayed.cash {
        Some((cached.cash, replayed.cash))
    } else {
        None
    };

    for cached_pos in &cached.positions {
        match replayed.positions.get(&cached_pos.symbol) {
            Some(live) if live == cached_pos => {}
            _ => symbols.push(cached_pos.symbol.clone()),
        }
    }
    for symbol in replayed.positions.keys() {
        if !cached.positions.iter().any(|p| &p.symbol == symbol) {
            symbols.push(symbol.clone());
        }
    }
    symbols.sort();
    symbols.dedup();

    if cash.is_none() && symbols.is_empty() {
        None
    } else {
        Some(Divergence { cash, symbols })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::{Position, TradeRecord, TradeSide};
    use rust_decimal_macros::dec;

    fn replayed_account() -> Account {
        let mut account = Account::new("test", dec!(10000));
        account
            .apply_trade(TradeRecord::new("AAPL", TradeSide::Buy, 10, dec!(100)).unwrap())
            .unwrap();
        account
    }

    fn faithful_snapshot(account: &Account) -> AccountSnapshot {
        AccountSnapshot {
            cash: account.cash,
            positions: account.positions_sorted(),
        }
    }

    #[test]
    fn faithful_cache_produces_no_divergence() {
        let account = replayed_account();
        assert_eq!(diff_snapshot(&account, &faithful_snapshot(&account)), None);
    }

    #[test]
    fn stale_cash_is_reported() {
        let account = replayed_account();
        let mut cached = faithful_snapshot(&account);
        cached.cash += dec!(1);

        let divergence = diff_snapshot(&account, &cached).unwrap();
        assert_eq!(divergence.cash, Some((dec!(9001), dec!(9000))));
        assert!(divergence.symbols.is_empty());
    }

    #[test]
    fn ghost_and_missing_positions_are_reported() {
        let account = replayed_account();
        let mut cached = faithful_snapshot(&account);
        // A position the ledger knows nothing about.
        cached.positions.push(Position {
            symbol: "MSFT".to_string(),
            quantity: 1,
            average_price: dec!(300),
        });
        // Drop the real one.
        cached.positions.retain(|p| p.symbol != "AAPL");

        let divergence = diff_snapshot(&account, &cached).unwrap();
        assert_eq!(divergence.symbols, vec!["AAPL", "MSFT"]);
    }
}
