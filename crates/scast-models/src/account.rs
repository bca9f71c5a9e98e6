//! Account balance and trial metadata.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A wallet's credit balance and trial state.
///
/// The balance is a single commingled counter: once paid credits land on
/// top of trial credits the two are indistinguishable. Trial expiry uses
/// the conservative rule documented on
/// [`TRIAL_CREDITS`](crate::credits::TRIAL_CREDITS).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AccountInfo {
    /// Externally issued wallet address identifying the account
    pub wallet_address: String,

    /// Current credit balance; never negative
    pub balance: i64,

    /// Trial expiry, present only while an unsettled trial grant exists
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trial_expires_at: Option<DateTime<Utc>>,
}

impl AccountInfo {
    /// Check whether an active (unexpired) trial grant exists.
    pub fn trial_active(&self, now: DateTime<Utc>) -> bool {
        self.trial_expires_at.map(|t| t > now).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_trial_active() {
        let now = Utc::now();
        let mut account = AccountInfo {
            wallet_address: "0xabc".into(),
            balance: 28,
            trial_expires_at: Some(now + Duration::days(7)),
        };
        assert!(account.trial_active(now));

        account.trial_expires_at = Some(now - Duration::hours(1));
        assert!(!account.trial_active(now));

        account.trial_expires_at = None;
        assert!(!account.trial_active(now));
    }
}
