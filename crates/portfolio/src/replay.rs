use crate::error::PortfolioError;
use core_types::{Position, TradeRecord, TradeSide};
use rust_decimal::Decimal;
use std::collections::HashMap;

/// The fixed rounding applied to the weighted-average price after every buy.
/// Rounding once per arithmetic step keeps full replay and incremental
/// application bit-for-bit identical.
pub const AVERAGE_PRICE_SCALE: u32 = 8;

/// Applies one trade to a position map. This is the incremental step of the
/// position calculator; replaying a whole ledger is a fold over it.
///
/// - A buy creates the position or folds the fill into the weighted average.
/// - A sell reduces quantity and leaves the average untouched; the realized
///   gain or loss `(price - average) * quantity` is returned to the caller,
///   never stored on the position. A position sold down to zero is removed.
///
/// Selling an unheld symbol or more shares than held is an error here: the
/// validator rejects such trades before execution, so hitting one of these
/// during replay means the ledger itself is inconsistent.
pub fn apply_to_positions(
    positions: &mut HashMap<String, Position>,
    trade: &TradeRecord,
) -> Result<Option<Decimal>, PortfolioError> {
    let overflow = || PortfolioError::Overflow(trade.symbol.clone());

    match trade.side {
        TradeSide::Buy => {
            // Checked arithmetic throughout: replay may be fed records that
            // never passed through the validator (e.g., a deserialized blob).
            let fill_cost = Decimal::from(trade.quantity)
                .checked_mul(trade.price)
                .ok_or_else(overflow)?;
            match positions.get_mut(&trade.symbol) {
                Some(position) => {
                    let new_quantity = position
                        .quantity
                        .checked_add(trade.quantity)
                        .ok_or_else(overflow)?;
                    let combined_cost = Decimal::from(position.quantity)
                        .checked_mul(position.average_price)
                        .and_then(|held_cost| held_cost.checked_add(fill_cost))
                        .ok_or_else(overflow)?;
                    position.average_price = (combined_cost / Decimal::from(new_quantity))
                        .round_dp(AVERAGE_PRICE_SCALE);
                    position.quantity = new_quantity;
                }
                None => {
                    positions.insert(
                        trade.symbol.clone(),
                        Position {
                            symbol: trade.symbol.clone(),
                            quantity: trade.quantity,
                            average_price: trade.price,
                        },
                    );
                }
            }
            Ok(None)
        }
        TradeSide::Sell => {
            let position = positions
                .get_mut(&trade.symbol)
                .ok_or_else(|| PortfolioError::MissingPosition(trade.symbol.clone()))?;

            if trade.quantity > position.quantity {
                return Err(PortfolioError::Oversold {
                    symbol: trade.symbol.clone(),
                    requested: trade.quantity,
                    held: position.quantity,
                });
            }

            // The sell price affects cash and realized P&L only, never the
            // stored average cost of the remaining shares.
            let realized = (trade.price - position.average_price)
                .checked_mul(Decimal::from(trade.quantity))
                .ok_or_else(overflow)?;
            position.quantity -= trade.quantity;

            if position.quantity == 0 {
                positions.remove(&trade.symbol);
            }

            Ok(Some(realized))
        }
    }
}

/// Derives the full position map from a ledger by replaying every trade in
/// order. Deterministic and idempotent: the same ledger always produces the
/// same map.
pub fn compute_positions(
    trades: &[TradeRecord],
) -> Result<HashMap<String, Position>, PortfolioError> {
    let mut positions = HashMap::new();
    for trade in trades {
        apply_to_positions(&mut positions, trade)?;
    }
    Ok(positions)
}
