//! Credit constants and the payment tier schedule.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Credits granted to a newly provisioned account.
///
/// Trial expiry compares the balance against this grant size: a balance
/// that never grew past it is treated as all-trial and zeroed on lapse,
/// while a larger balance is assumed to contain paid credit and is left
/// untouched. The two kinds of credit share one balance column, so this
/// is a deliberate heuristic rather than exact accounting.
pub const TRIAL_CREDITS: i64 = 28;

/// Length of the trial window, in days from first provisioning.
pub const TRIAL_PERIOD_DAYS: i64 = 7;

/// One purchasable credit package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CreditTier {
    /// Purchase amount in whole currency units (the tier key)
    pub price: u32,
    /// Credits granted for this tier
    pub credits: i64,
}

/// Enumerated mapping from purchase tier to granted credits.
///
/// Parsed and validated once at startup; payment confirmations look up
/// tiers here instead of consulting an ad hoc table per request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CreditTierSchedule {
    tiers: Vec<CreditTier>,
}

/// Errors raised while building a tier schedule.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TierScheduleError {
    #[error("tier schedule is empty")]
    Empty,

    #[error("duplicate tier for price {0}")]
    DuplicatePrice(u32),

    #[error("tier for price {price} grants non-positive credits ({credits})")]
    NonPositiveCredits { price: u32, credits: i64 },

    #[error("malformed tier entry: {0:?} (expected \"price:credits\")")]
    Malformed(String),
}

impl CreditTierSchedule {
    /// Build a schedule from explicit tiers, validating invariants.
    pub fn new(tiers: Vec<CreditTier>) -> Result<Self, TierScheduleError> {
        if tiers.is_empty() {
            return Err(TierScheduleError::Empty);
        }
        let mut seen = std::collections::HashSet::new();
        for tier in &tiers {
            if !seen.insert(tier.price) {
                return Err(TierScheduleError::DuplicatePrice(tier.price));
            }
            if tier.credits <= 0 {
                return Err(TierScheduleError::NonPositiveCredits {
                    price: tier.price,
                    credits: tier.credits,
                });
            }
        }
        Ok(Self { tiers })
    }

    /// Parse a schedule from a compact string: `"5:30,10:80,20:150"`.
    pub fn parse(s: &str) -> Result<Self, TierScheduleError> {
        let mut tiers = Vec::new();
        for entry in s.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (price, credits) = entry
                .split_once(':')
                .ok_or_else(|| TierScheduleError::Malformed(entry.to_string()))?;
            let price: u32 = price
                .trim()
                .parse()
                .map_err(|_| TierScheduleError::Malformed(entry.to_string()))?;
            let credits: i64 = credits
                .trim()
                .parse()
                .map_err(|_| TierScheduleError::Malformed(entry.to_string()))?;
            tiers.push(CreditTier { price, credits });
        }
        Self::new(tiers)
    }

    /// Credits granted for a purchase tier, if the tier exists.
    pub fn credits_for(&self, price: u32) -> Option<i64> {
        self.tiers
            .iter()
            .find(|t| t.price == price)
            .map(|t| t.credits)
    }

    /// All configured tiers, ordered as configured.
    pub fn tiers(&self) -> &[CreditTier] {
        &self.tiers
    }
}

impl Default for CreditTierSchedule {
    /// Standard schedule: $5 -> 30, $10 -> 80, $20 -> 150 credits.
    fn default() -> Self {
        Self::new(vec![
            CreditTier { price: 5, credits: 30 },
            CreditTier { price: 10, credits: 80 },
            CreditTier { price: 20, credits: 150 },
        ])
        .expect("default tier schedule is valid")
    }
}
