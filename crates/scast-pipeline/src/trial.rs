//! Exactly-once settlement of lapsed trial grants.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use scast_models::TRIAL_CREDITS;
use scast_store::{AccountStore, StoreResult};

/// Reconciles a lapsed trial, idempotently, tolerant of being invoked
/// zero or many times per account.
///
/// The balance column commingles trial and paid credit, so settlement
/// uses a conservative heuristic: a balance that never grew past the
/// original grant is treated as all-trial and zeroed; a larger balance
/// is assumed to contain paid credit and is left untouched. Either way
/// the trial marker is cleared, so the lapse branch never re-fires.
#[derive(Clone)]
pub struct TrialManager {
    accounts: Arc<dyn AccountStore>,
    initial_credits: i64,
}

impl TrialManager {
    pub fn new(accounts: Arc<dyn AccountStore>) -> Self {
        Self {
            accounts,
            initial_credits: TRIAL_CREDITS,
        }
    }

    /// Override the grant size the lapse heuristic compares against.
    pub fn with_initial_credits(mut self, credits: i64) -> Self {
        self.initial_credits = credits;
        self
    }

    /// Settle the account's trial if it has lapsed.
    ///
    /// Returns the balance after settlement, or `None` when the account
    /// is not provisioned. Must run before any balance check that gates
    /// spending, so an expired trial cannot be spent after its window
    /// closes.
    pub async fn settle(&self, wallet: &str) -> StoreResult<Option<i64>> {
        let Some(account) = self.accounts.get_account(wallet).await? else {
            return Ok(None);
        };

        let Some(expires_at) = account.trial_expires_at else {
            // Already settled (or never had a trial): nothing to do.
            return Ok(Some(account.balance));
        };

        if expires_at > Utc::now() {
            debug!(wallet = %wallet, expires_at = %expires_at, "Trial still active");
            return Ok(Some(account.balance));
        }

        let zero_balance = account.balance <= self.initial_credits;
        self.accounts.clear_trial(wallet, zero_balance).await?;

        let balance_after = if zero_balance { 0 } else { account.balance };
        info!(
            wallet = %wallet,
            zeroed = zero_balance,
            balance_after = balance_after,
            "Settled lapsed trial"
        );
        Ok(Some(balance_after))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::Duration;
    use scast_store::MemoryStore;

    fn manager(store: &Arc<MemoryStore>) -> TrialManager {
        TrialManager::new(Arc::clone(store) as Arc<dyn AccountStore>)
    }

    #[tokio::test]
    async fn test_unknown_account_is_a_noop() {
        let store = Arc::new(MemoryStore::new());
        assert_eq!(manager(&store).settle("0xmissing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_active_trial_is_untouched() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_account("0xabc", 28, Utc::now() + Duration::days(3))
            .await
            .unwrap();

        assert_eq!(manager(&store).settle("0xabc").await.unwrap(), Some(28));
        let account = store.get_account("0xabc").await.unwrap().unwrap();
        assert_eq!(account.balance, 28);
        assert!(account.trial_expires_at.is_some());
    }

    #[tokio::test]
    async fn test_lapsed_trial_at_or_below_grant_is_zeroed() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_account("0xabc", 10, Utc::now() - Duration::hours(1))
            .await
            .unwrap();

        assert_eq!(manager(&store).settle("0xabc").await.unwrap(), Some(0));
        let account = store.get_account("0xabc").await.unwrap().unwrap();
        assert_eq!(account.balance, 0);
        assert!(account.trial_expires_at.is_none());
    }

    #[tokio::test]
    async fn test_lapsed_trial_above_grant_keeps_balance() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_account("0xabc", 50, Utc::now() - Duration::hours(1))
            .await
            .unwrap();

        assert_eq!(manager(&store).settle("0xabc").await.unwrap(), Some(50));
        let account = store.get_account("0xabc").await.unwrap().unwrap();
        assert_eq!(account.balance, 50);
        assert!(account.trial_expires_at.is_none());
    }

    #[tokio::test]
    async fn test_settlement_is_idempotent() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_account("0xabc", 10, Utc::now() - Duration::hours(1))
            .await
            .unwrap();

        let trial = manager(&store);
        assert_eq!(trial.settle("0xabc").await.unwrap(), Some(0));

        // Paid credit granted after settlement must survive repeats.
        store.grant("0xabc", 30).await.unwrap();
        assert_eq!(trial.settle("0xabc").await.unwrap(), Some(30));
        assert_eq!(trial.settle("0xabc").await.unwrap(), Some(30));
        assert_eq!(
            store.get_account("0xabc").await.unwrap().unwrap().balance,
            30
        );
    }
}
