//! Player coin balance

use crate::ledger::BalanceSink;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error};
use wallnance_core::{Error, Result};
use wallnance_persistence::snapshot::{load_number, save_number};
use wallnance_persistence::{keys, KeyValueStore};

/// Spendable coin balance, persisted as a stringified number.
///
/// A change only sticks if its write succeeds; otherwise the previous
/// balance is restored and the error returned.
pub struct Wallet<S> {
    store: Arc<S>,
    balance: Mutex<f64>,
}

impl<S: KeyValueStore> Wallet<S> {
    /// Restore the balance, seeding `starting_balance` on first run
    pub async fn load(store: Arc<S>, starting_balance: f64) -> Result<Self> {
        let balance = match load_number(store.as_ref(), keys::PLAYER_BALANCE).await? {
            Some(balance) => balance,
            None => {
                save_number(store.as_ref(), keys::PLAYER_BALANCE, starting_balance).await?;
                debug!("Seeded new wallet with {} coins", starting_balance);
                starting_balance
            }
        };

        Ok(Self {
            store,
            balance: Mutex::new(balance),
        })
    }

    pub async fn balance(&self) -> f64 {
        *self.balance.lock().await
    }

    /// Add coins, returning the new balance
    pub async fn credit(&self, amount: f64) -> Result<f64> {
        validate_amount(amount)?;
        let mut balance = self.balance.lock().await;
        let next = *balance + amount;
        self.commit(&mut balance, next).await
    }

    /// Remove coins, returning the new balance
    pub async fn debit(&self, amount: f64) -> Result<f64> {
        validate_amount(amount)?;
        let mut balance = self.balance.lock().await;
        if amount > *balance {
            return Err(Error::InsufficientFunds {
                required: amount,
                available: *balance,
            });
        }
        let next = *balance - amount;
        self.commit(&mut balance, next).await
    }

    async fn commit(&self, balance: &mut f64, next: f64) -> Result<f64> {
        if let Err(e) = save_number(self.store.as_ref(), keys::PLAYER_BALANCE, next).await {
            error!("Failed to persist balance: {}", e);
            return Err(e);
        }
        *balance = next;
        Ok(next)
    }
}

impl<S: KeyValueStore> BalanceSink for Wallet<S> {
    async fn credit(&self, coins: f64) -> Result<f64> {
        Wallet::credit(self, coins).await
    }
}

fn validate_amount(amount: f64) -> Result<()> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(Error::InvalidAmount(format!(
            "coin amount must be a finite non-negative number, got {}",
            amount
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wallnance_persistence::MemoryStore;

    #[tokio::test]
    async fn test_seeds_and_restores_balance() {
        let store = Arc::new(MemoryStore::new());
        let wallet = Wallet::load(store.clone(), 1_000.0).await.unwrap();
        assert_eq!(wallet.balance().await, 1_000.0);
        assert_eq!(store.get("player_balance").await.unwrap().as_deref(), Some("1000"));

        wallet.credit(250.5).await.unwrap();
        let reloaded = Wallet::load(store, 1_000.0).await.unwrap();
        assert_eq!(reloaded.balance().await, 1_250.5);
    }

    #[tokio::test]
    async fn test_debit_insufficient_funds() {
        let store = Arc::new(MemoryStore::new());
        let wallet = Wallet::load(store, 100.0).await.unwrap();

        let err = wallet.debit(150.0).await.unwrap_err();
        assert!(matches!(err, Error::InsufficientFunds { required, available }
            if required == 150.0 && available == 100.0));
        assert_eq!(wallet.debit(100.0).await.unwrap(), 0.0);
    }

    #[tokio::test]
    async fn test_rejects_bad_amounts() {
        let store = Arc::new(MemoryStore::new());
        let wallet = Wallet::load(store, 100.0).await.unwrap();

        assert!(wallet.credit(-1.0).await.is_err());
        assert!(wallet.debit(f64::NAN).await.is_err());
        assert_eq!(wallet.balance().await, 100.0);
    }

    #[tokio::test]
    async fn test_failed_write_keeps_old_balance() {
        let store = Arc::new(MemoryStore::new());
        let wallet = Wallet::load(store.clone(), 100.0).await.unwrap();
        store.set_fail_writes(true);

        assert!(wallet.credit(50.0).await.unwrap_err().is_storage());
        assert_eq!(wallet.balance().await, 100.0);
    }
}
