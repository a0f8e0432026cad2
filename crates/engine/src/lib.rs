//! # Tally Engine Crate
//!
//! The central orchestrator: the only entry point through which an account's
//! state changes. It wires the validator, the portfolio state, the durable
//! store, and (when configured) the external trade log into one atomic
//! `submit_trade` step, and exposes the read API callers see.
//!
//! ## Architectural Principles
//!
//! - **Atomic Commits:** A trade either fully happens (cash, ledger, cached
//!   positions, durable blobs) or not at all. The engine computes the next
//!   state on a clone, persists it, and only then swaps it into memory, so
//!   any failure leaves the pre-trade state intact.
//! - **One Authority Per Deployment:** Without a chain binding the local
//!   ledger is the source of truth. With one, the external log is, and the
//!   local ledger/snapshot pair is a read-through cache rebuilt from
//!   `fetch_trades` after every confirmed write and on every `refresh()`.
//! - **Serialized Mutation:** One logical owner per account. A submission
//!   that finds another trade in flight is rejected with `TradeInFlight`
//!   rather than validated against stale state.
//!
//! ## Public API
//!
//! - `TradingEngine`: `submit_trade`, `position`, `positions`, `history`,
//!   `cash_balance`, `refresh`.
//! - `TradeOutcome`: the receipt handed back for an executed trade.
//! - `EngineError`: the specific error types that can be returned from this crate.

use chain_client::{ChainError, TradeLog};
use core_types::{Position, TradeRecord, TradeSide};
use portfolio::Account;
use risk::TradeValidator;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use store::{AccountSnapshot, StateStore, StoreError};
use tokio::sync::Mutex;

// Declare the modules that constitute this crate.
pub mod error;
pub mod outcome;
pub mod reconciler;

// Re-export the key components to provide a clean, public-facing API.
pub use error::EngineError;
pub use outcome::TradeOutcome;
pub use reconciler::Divergence;

/// The external trade log an engine is bound to, if any.
struct ChainBinding {
    log: Arc<dyn TradeLog>,
    /// The account reference the log knows trades under (e.g., a wallet
    /// address), which need not equal the local account id.
    account_ref: String,
    /// How long to wait for a confirmation before treating the trade as
    /// failed. A later `refresh()` converges state if the log confirms late.
    confirm_timeout: Duration,
}

/// The trading engine for a single account.
pub struct TradingEngine {
    account: Mutex<Account>,
    store: Arc<dyn StateStore>,
    chain: Option<ChainBinding>,
    validator: TradeValidator,
    /// Times a cached snapshot disagreed with ledger replay. A bug signal,
    /// observable but never fatal.
    divergences: AtomicU64,
}

fn snapshot_of(account: &Account) -> AccountSnapshot {
    AccountSnapshot {
        cash: account.cash,
        positions: account.positions_sorted(),
    }
}

impl TradingEngine {
    /// Opens an engine whose local ledger is the source of truth. The ledger
    /// is loaded from the store and replayed; the cached snapshot is audited
    /// against the replay and rewritten.
    pub async fn open_local(
        account_id: &str,
        starting_cash: Decimal,
        store: Arc<dyn StateStore>,
    ) -> Result<Self, EngineError> {
        let trades = store.load_ledger(account_id).await?.unwrap_or_default();
        let account = Account::replay(account_id, starting_cash, trades)?;

        let divergences = AtomicU64::new(0);
        Self::audit_snapshot(&*store, &account, &divergences).await?;
        store
            .replace_snapshot(account_id, &snapshot_of(&account))
            .await?;

        tracing::info!(
            account_id,
            trades = account.ledger.len(),
            cash = %account.cash,
            "opened account from local ledger"
        );

        Ok(Self {
            account: Mutex::new(account),
            store,
            chain: None,
            validator: TradeValidator::new(),
            divergences,
        })
    }

    /// Opens an engine bound to an external trade log, which becomes the
    /// source of truth. The full history is fetched and replayed, and the
    /// local ledger/snapshot blobs become a cache of it.
    pub async fn open_with_chain(
        account_id: &str,
        starting_cash: Decimal,
        store: Arc<dyn StateStore>,
        log: Arc<dyn TradeLog>,
        account_ref: impl Into<String>,
        confirm_timeout: Duration,
    ) -> Result<Self, EngineError> {
        let account_ref = account_ref.into();
        let trades = log.fetch_trades(&account_ref).await?;
        let account = Account::replay(account_id, starting_cash, trades)?;

        let divergences = AtomicU64::new(0);
        Self::audit_snapshot(&*store, &account, &divergences).await?;
        store
            .replace_snapshot(account_id, &snapshot_of(&account))
            .await?;
        store.replace_ledger(account_id, &account.ledger).await?;

        tracing::info!(
            account_id,
            account_ref,
            trades = account.ledger.len(),
            cash = %account.cash,
            "opened account from external trade log"
        );

        Ok(Self {
            account: Mutex::new(account),
            store,
            chain: Some(ChainBinding {
                log,
                account_ref,
                confirm_timeout,
            }),
            validator: TradeValidator::new(),
            divergences,
        })
    }

    async fn audit_snapshot(
        store: &dyn StateStore,
        account: &Account,
        divergences: &AtomicU64,
    ) -> Result<(), EngineError> {
        if let Some(cached) = store.load_snapshot(&account.account_id).await? {
            if let Some(divergence) = reconciler::diff_snapshot(account, &cached) {
                divergences.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    account_id = %account.account_id,
                    %divergence,
                    "cached positions diverged from ledger replay; recomputed"
                );
            }
        }
        Ok(())
    }

    /// The only mutating entry point: validates, commits, persists.
    ///
    /// Rejections and failures leave every observable piece of state (cash,
    /// ledger, positions, durable blobs) exactly as it was.
    pub async fn submit_trade(
        &self,
        side: TradeSide,
        symbol: &str,
        quantity: u64,
        price: Decimal,
    ) -> Result<TradeOutcome, EngineError> {
        let mut guard = self
            .account
            .try_lock()
            .map_err(|_| EngineError::TradeInFlight)?;

        if let Some(chain) = &self.chain {
            // The log is the source of truth: validate against a freshly
            // refreshed view, never the cached one.
            let trades = chain.log.fetch_trades(&chain.account_ref).await?;
            let account_id = guard.account_id.clone();
            *guard = Account::replay(account_id, guard.starting_cash, trades)?;
        }

        self.validator
            .validate(&guard, side, symbol, quantity, price)?;

        let outcome = match &self.chain {
            None => {
                self.commit_local(&mut guard, side, symbol, quantity, price)
                    .await?
            }
            Some(chain) => {
                self.commit_external(&mut guard, chain, side, symbol, quantity, price)
                    .await?
            }
        };

        tracing::info!(
            account_id = %guard.account_id,
            symbol = %outcome.trade.symbol,
            side = %outcome.trade.side,
            quantity = outcome.trade.quantity,
            price = %outcome.trade.price,
            cash = %outcome.cash_balance,
            "trade committed"
        );

        Ok(outcome)
    }

    async fn commit_local(
        &self,
        guard: &mut Account,
        side: TradeSide,
        symbol: &str,
        quantity: u64,
        price: Decimal,
    ) -> Result<TradeOutcome, EngineError> {
        let trade = TradeRecord::new(symbol, side, quantity, price)?;

        let mut next = guard.clone();
        let realized = next.apply_trade(trade.clone())?;

        self.persist(&next).await?;

        let outcome = outcome_for(&next, trade, realized, None);
        *guard = next;
        Ok(outcome)
    }

    async fn commit_external(
        &self,
        guard: &mut Account,
        chain: &ChainBinding,
        side: TradeSide,
        symbol: &str,
        quantity: u64,
        price: Decimal,
    ) -> Result<TradeOutcome, EngineError> {
        let confirm = chain
            .log
            .record_trade(&chain.account_ref, side, symbol, quantity, price);
        let receipt = tokio::time::timeout(chain.confirm_timeout, confirm)
            .await
            .map_err(|_| ChainError::Timeout(chain.confirm_timeout.as_secs()))??;

        // The log durably accepted the trade. Converge the local cache from
        // the authority rather than applying our own view of the trade. The
        // confirmed record is found by the id its receipt derives to, since
        // another writer may have landed trades behind ours in the meantime.
        let trades = chain.log.fetch_trades(&chain.account_ref).await?;
        let confirmed_id = chain_client::trade_id_for_tx_ref(&receipt.tx_ref);
        let confirmed_at = trades
            .iter()
            .rposition(|t| t.trade_id == confirmed_id)
            .ok_or_else(|| {
                ChainError::InvalidData(format!(
                    "confirmed trade {} missing from the fetched history",
                    receipt.tx_ref
                ))
            })?;

        let account_id = guard.account_id.clone();
        let mut next = Account::replay(
            account_id,
            guard.starting_cash,
            trades[..confirmed_at].to_vec(),
        )?;
        let recorded = trades[confirmed_at].clone();
        let realized = next.apply_trade(recorded.clone())?;
        for trade in trades.into_iter().skip(confirmed_at + 1) {
            next.apply_trade(trade)?;
        }

        self.persist(&next).await?;

        let outcome = outcome_for(&next, recorded, realized, Some(receipt.tx_ref));
        *guard = next;
        Ok(outcome)
    }

    /// Persists the snapshot cache first and the ledger last: the ledger
    /// write is the commit point. A stale snapshot left behind by a failed
    /// ledger write is caught by the divergence audit and rewritten.
    async fn persist(&self, account: &Account) -> Result<(), StoreError> {
        self.store
            .replace_snapshot(&account.account_id, &snapshot_of(account))
            .await?;
        self.store
            .replace_ledger(&account.account_id, &account.ledger)
            .await?;
        Ok(())
    }

    /// Forces a full replay from the authoritative source (external log when
    /// bound, the stored ledger otherwise), audits the in-memory cache
    /// against it, and persists the refreshed state. Idempotent.
    pub async fn refresh(&self) -> Result<(), EngineError> {
        let mut guard = self.account.lock().await;

        let trades = match &self.chain {
            Some(chain) => chain.log.fetch_trades(&chain.account_ref).await?,
            None => self
                .store
                .load_ledger(&guard.account_id)
                .await?
                .unwrap_or_default(),
        };
        let account_id = guard.account_id.clone();
        let fresh = Account::replay(account_id, guard.starting_cash, trades)?;

        if let Some(divergence) = reconciler::diff_snapshot(&fresh, &snapshot_of(&guard)) {
            self.divergences.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(
                account_id = %fresh.account_id,
                %divergence,
                "cached positions diverged from replay during refresh; recomputed"
            );
        }

        self.persist(&fresh).await?;
        *guard = fresh;
        Ok(())
    }

    pub async fn position(&self, symbol: &str) -> Option<Position> {
        self.account.lock().await.position(symbol).cloned()
    }

    /// All open positions, ordered by symbol.
    pub async fn positions(&self) -> Vec<Position> {
        self.account.lock().await.positions_sorted()
    }

    /// The most recent trades first, up to `limit`.
    pub async fn history(&self, limit: usize) -> Vec<TradeRecord> {
        self.account.lock().await.history(limit)
    }

    pub async fn cash_balance(&self) -> Decimal {
        self.account.lock().await.cash
    }

    /// How often a cached snapshot has disagreed with ledger replay since
    /// this engine was opened.
    pub fn divergence_count(&self) -> u64 {
        self.divergences.load(Ordering::Relaxed)
    }
}

fn outcome_for(
    account: &Account,
    trade: TradeRecord,
    realized: Option<Decimal>,
    tx_ref: Option<String>,
) -> TradeOutcome {
    let message = match trade.side {
        TradeSide::Buy => "Purchase successful".to_string(),
        TradeSide::Sell => "Sale successful".to_string(),
    };

    TradeOutcome {
        message,
        cash_balance: account.cash,
        position: account.position(&trade.symbol).cloned(),
        realized_pnl: realized,
        tx_ref,
        trade,
    }
}
