use crate::enums::TradeSide;
use crate::error::CoreError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single executed trade. Records are immutable once created and are only
/// ever appended to an account's ledger, never edited or re-ordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub trade_id: Uuid,
    pub symbol: String,
    pub side: TradeSide,
    /// Number of shares. Whole shares only; fractional trading is not modeled.
    pub quantity: u64,
    /// Price per share at execution time.
    pub price: Decimal,
    pub executed_at: DateTime<Utc>,
}

impl TradeRecord {
    /// Creates a new trade record with a fresh id, stamped at the current time.
    /// Enforces the record invariants: non-empty symbol, `quantity > 0`, `price > 0`.
    pub fn new(
        symbol: &str,
        side: TradeSide,
        quantity: u64,
        price: Decimal,
    ) -> Result<Self, CoreError> {
        Self::with_metadata(symbol, side, quantity, price, Uuid::new_v4(), Utc::now())
    }

    /// Creates a trade record with an externally supplied id and timestamp,
    /// used when normalizing records replayed from an external trade log.
    pub fn with_metadata(
        symbol: &str,
        side: TradeSide,
        quantity: u64,
        price: Decimal,
        trade_id: Uuid,
        executed_at: DateTime<Utc>,
    ) -> Result<Self, CoreError> {
        let symbol = symbol.trim();
        if symbol.is_empty() {
            return Err(CoreError::InvalidInput(
                "symbol".to_string(),
                "must not be empty".to_string(),
            ));
        }
        if quantity == 0 {
            return Err(CoreError::InvalidInput(
                "quantity".to_string(),
                "must be greater than zero".to_string(),
            ));
        }
        if price <= Decimal::ZERO {
            return Err(CoreError::InvalidInput(
                "price".to_string(),
                format!("must be greater than zero, got {}", price),
            ));
        }
        if Decimal::from(quantity).checked_mul(price).is_none() {
            return Err(CoreError::InvalidInput(
                "quantity".to_string(),
                format!(
                    "trade value of {quantity} shares at {price} exceeds the representable amount"
                ),
            ));
        }

        Ok(Self {
            trade_id,
            symbol: symbol.to_uppercase(),
            side,
            quantity,
            price,
            executed_at,
        })
    }

    /// The cash value of this trade: `quantity * price`. Cannot overflow for
    /// constructed records; the constructors reject an unrepresentable value.
    pub fn notional(&self) -> Decimal {
        Decimal::from(self.quantity) * self.price
    }
}

/// A current holding in one symbol, described by quantity and weighted-average
/// cost. A position exists iff its quantity is greater than zero; a holding
/// that is sold down to zero is removed from the account, not kept around.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub quantity: u64,
    pub average_price: Decimal,
}

impl Position {
    /// Total cost basis of the holding: `quantity * average_price`.
    pub fn total_cost(&self) -> Decimal {
        Decimal::from(self.quantity) * self.average_price
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn constructor_normalizes_and_validates() {
        assert!(TradeRecord::new("", TradeSide::Buy, 1, dec!(1)).is_err());
        assert!(TradeRecord::new("AAPL", TradeSide::Buy, 0, dec!(1)).is_err());
        assert!(TradeRecord::new("AAPL", TradeSide::Sell, 1, dec!(0)).is_err());
        assert!(TradeRecord::new("AAPL", TradeSide::Sell, 1, dec!(-5)).is_err());

        let record = TradeRecord::new(" aapl ", TradeSide::Buy, 2, dec!(10.5)).unwrap();
        assert_eq!(record.symbol, "AAPL");
        assert_eq!(record.notional(), dec!(21));
    }

    #[test]
    fn unrepresentable_trade_value_is_rejected() {
        let err =
            TradeRecord::new("AAPL", TradeSide::Buy, u64::MAX, dec!(10000000000)).unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(..)));
    }
}
