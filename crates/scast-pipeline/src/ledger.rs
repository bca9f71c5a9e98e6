//! Prepaid credit ledger.
//!
//! Wraps an injected [`AccountStore`] and owns the admission-side rules:
//! lazy provisioning with a trial grant, trial settlement before any
//! spend gate, and the atomic reservation primitive. The balance is
//! never read-modify-written here; every mutation goes through the
//! store's single-statement operations.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{info, warn};

use scast_models::{AccountInfo, TRIAL_CREDITS, TRIAL_PERIOD_DAYS};
use scast_store::{AccountStore, DeductOutcome};

use crate::error::{PipelineError, PipelineResult};
use crate::trial::TrialManager;

#[derive(Clone)]
pub struct Ledger {
    accounts: Arc<dyn AccountStore>,
    trial: TrialManager,
}

impl Ledger {
    pub fn new(accounts: Arc<dyn AccountStore>) -> Self {
        let trial = TrialManager::new(Arc::clone(&accounts));
        Self { accounts, trial }
    }

    /// Idempotently provision the account, granting the trial balance on
    /// first reference.
    ///
    /// A lapsed trial is settled first so it cannot be spent after its
    /// window closed. Settlement faults are logged and swallowed:
    /// admission proceeds as if no trial existed.
    pub async fn ensure(&self, wallet: &str) -> PipelineResult<()> {
        if let Err(e) = self.trial.settle(wallet).await {
            warn!(wallet = %wallet, error = %e, "Trial reconciliation failed; continuing");
        }

        let expires_at = Utc::now() + Duration::days(TRIAL_PERIOD_DAYS);
        let created = self
            .accounts
            .insert_account(wallet, TRIAL_CREDITS, expires_at)
            .await
            .map_err(PipelineError::Ledger)?;

        if created {
            info!(
                wallet = %wallet,
                credits = TRIAL_CREDITS,
                expires_at = %expires_at,
                "Granted trial credits to new account"
            );
        }
        Ok(())
    }

    /// Atomically reserve `amount` credits. [`DeductOutcome::Insufficient`]
    /// is a normal outcome, not an error.
    pub async fn deduct(&self, wallet: &str, amount: i64) -> PipelineResult<DeductOutcome> {
        self.accounts
            .deduct(wallet, amount)
            .await
            .map_err(PipelineError::Ledger)
    }

    /// Credit an externally confirmed payment. Auto-provisions the
    /// account first; returns the new balance.
    pub async fn grant(&self, wallet: &str, amount: i64) -> PipelineResult<i64> {
        self.ensure(wallet).await?;
        let balance = self
            .accounts
            .grant(wallet, amount)
            .await
            .map_err(PipelineError::Ledger)?;
        info!(wallet = %wallet, amount = amount, balance = balance, "Granted credits");
        Ok(balance)
    }

    /// Current balance and trial metadata, settling a lapsed trial
    /// first (settlement faults logged, non-fatal). Read-only with
    /// respect to the balance itself; slight staleness against a
    /// concurrent deduct is acceptable for display.
    pub async fn query(&self, wallet: &str) -> PipelineResult<Option<AccountInfo>> {
        if let Err(e) = self.trial.settle(wallet).await {
            warn!(wallet = %wallet, error = %e, "Trial reconciliation failed; continuing");
        }
        self.accounts
            .get_account(wallet)
            .await
            .map_err(PipelineError::Ledger)
    }

    /// Connectivity probe for health checks.
    pub async fn ping(&self) -> PipelineResult<()> {
        self.accounts.ping().await.map_err(PipelineError::Ledger)
    }
}
