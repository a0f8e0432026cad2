use crate::error::Rejection;
use core_types::TradeSide;
use portfolio::Account;
use rust_decimal::Decimal;

/// Pre-flight checks for a proposed trade.
///
/// A pure function of the current account state and the proposal: no side
/// effects, no clock, no I/O. The executor runs this before touching any
/// state, and a `Rejection` guarantees nothing was mutated.
#[derive(Debug, Clone, Default)]
pub struct TradeValidator;

impl TradeValidator {
    pub fn new() -> Self {
        Self
    }

    pub fn validate(
        &self,
        account: &Account,
        side: TradeSide,
        symbol: &str,
        quantity: u64,
        price: Decimal,
    ) -> Result<(), Rejection> {
        // Input shape first, before any state access.
        let symbol = symbol.trim();
        if symbol.is_empty() {
            return Err(Rejection::InvalidInput {
                field: "symbol".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        if quantity == 0 {
            return Err(Rejection::InvalidInput {
                field: "quantity".to_string(),
                reason: "must be a positive number of shares".to_string(),
            });
        }
        if price <= Decimal::ZERO {
            return Err(Rejection::InvalidInput {
                field: "price".to_string(),
                reason: format!("must be greater than zero, got {price}"),
            });
        }

        match side {
            TradeSide::Buy => {
                let required = match Decimal::from(quantity).checked_mul(price) {
                    Some(required) => required,
                    // Structurally valid but unrepresentable: surface a
                    // rejection, never a fault.
                    None => {
                        return Err(Rejection::InvalidInput {
                            field: "quantity".to_string(),
                            reason: format!(
                                "trade value of {quantity} shares at {price} exceeds the representable amount"
                            ),
                        });
                    }
                };
                if required > account.cash {
                    return Err(Rejection::InsufficientFunds {
                        required,
                        available: account.cash,
                        shortfall: required - account.cash,
                    });
                }
            }
            TradeSide::Sell => match account.position(symbol) {
                None => {
                    return Err(Rejection::NoPosition {
                        symbol: symbol.to_uppercase(),
                    });
                }
                Some(position) if position.quantity < quantity => {
                    return Err(Rejection::InsufficientShares {
                        symbol: position.symbol.clone(),
                        requested: quantity,
                        held: position.quantity,
                    });
                }
                Some(_) => {}
            },
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::TradeRecord;
    use rust_decimal_macros::dec;

    fn account_with_position() -> Account {
        let mut account = Account::new("test", dec!(1000));
        account
            .apply_trade(TradeRecord::new("AAPL", TradeSide::Buy, 5, dec!(100)).unwrap())
            .unwrap();
        account
    }

    #[test]
    fn accepts_a_funded_buy() {
        let validator = TradeValidator::new();
        let account = Account::new("test", dec!(1000));
        assert!(
            validator
                .validate(&account, TradeSide::Buy, "AAPL", 10, dec!(100))
                .is_ok()
        );
    }

    #[test]
    fn rejects_a_buy_beyond_available_cash_with_shortfall() {
        let validator = TradeValidator::new();
        let account = Account::new("test", dec!(1000));

        let rejection = validator
            .validate(&account, TradeSide::Buy, "AAPL", 11, dec!(100))
            .unwrap_err();

        assert_eq!(
            rejection,
            Rejection::InsufficientFunds {
                required: dec!(1100),
                available: dec!(1000),
                shortfall: dec!(100),
            }
        );
    }

    #[test]
    fn rejects_a_sell_of_an_unheld_symbol() {
        let validator = TradeValidator::new();
        let account = account_with_position();

        let rejection = validator
            .validate(&account, TradeSide::Sell, "MSFT", 1, dec!(50))
            .unwrap_err();

        assert_eq!(
            rejection,
            Rejection::NoPosition {
                symbol: "MSFT".to_string()
            }
        );
    }

    #[test]
    fn rejects_a_sell_larger_than_the_holding() {
        let validator = TradeValidator::new();
        let account = account_with_position();

        let rejection = validator
            .validate(&account, TradeSide::Sell, "AAPL", 6, dec!(50))
            .unwrap_err();

        assert_eq!(
            rejection,
            Rejection::InsufficientShares {
                symbol: "AAPL".to_string(),
                requested: 6,
                held: 5,
            }
        );
    }

    #[test]
    fn rejects_bad_inputs_before_state_checks() {
        let validator = TradeValidator::new();
        let account = Account::new("test", dec!(0));

        for (side, symbol, quantity, price) in [
            (TradeSide::Buy, "", 1, dec!(1)),
            (TradeSide::Buy, "AAPL", 0, dec!(1)),
            (TradeSide::Sell, "AAPL", 1, dec!(0)),
            (TradeSide::Sell, "AAPL", 1, dec!(-5)),
        ] {
            let rejection = validator
                .validate(&account, side, symbol, quantity, price)
                .unwrap_err();
            assert!(
                matches!(rejection, Rejection::InvalidInput { .. }),
                "expected InvalidInput for {symbol:?}/{quantity}/{price}"
            );
        }
    }

    #[test]
    fn rejects_a_buy_whose_value_overflows_decimal() {
        let validator = TradeValidator::new();
        let account = Account::new("test", dec!(1000));

        let rejection = validator
            .validate(
                &account,
                TradeSide::Buy,
                "AAPL",
                u64::MAX,
                dec!(10000000000),
            )
            .unwrap_err();

        assert!(matches!(rejection, Rejection::InvalidInput { .. }));
    }

    #[test]
    fn symbol_lookup_is_case_insensitive() {
        let validator = TradeValidator::new();
        let account = account_with_position();

        assert!(
            validator
                .validate(&account, TradeSide::Sell, "aapl", 5, dec!(50))
                .is_ok()
        );
    }
}
