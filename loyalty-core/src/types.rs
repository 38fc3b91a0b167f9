//! Core types for the loyalty ledger
//!
//! All types serialize with serde: JSON at the HTTP boundary, bincode at
//! rest. Points are whole integers; tiers are derived, never assigned.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Points credited to a referrer when another customer uses their code.
pub const REFERRAL_BONUS: i64 = 100;

/// Customer identifier, owned by the Customer Registry
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CustomerId(String);

impl CustomerId {
    /// Create new customer ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Loyalty tier, derived from accumulated points
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tier {
    /// Fewer than 500 points
    Bronze,
    /// 500 to 1999 points
    Silver,
    /// 2000 points and up
    Gold,
}

impl Tier {
    /// Points required to enter Silver
    pub const SILVER_THRESHOLD: i64 = 500;

    /// Points required to enter Gold
    pub const GOLD_THRESHOLD: i64 = 2000;

    /// Highest tier whose threshold is at or below `points`
    pub fn for_points(points: i64) -> Self {
        if points >= Self::GOLD_THRESHOLD {
            Tier::Gold
        } else if points >= Self::SILVER_THRESHOLD {
            Tier::Silver
        } else {
            Tier::Bronze
        }
    }

    /// Tier name as stored and reported
    pub fn name(&self) -> &'static str {
        match self {
            Tier::Bronze => "Bronze",
            Tier::Silver => "Silver",
            Tier::Gold => "Gold",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Customer Registry document, committed in the same batch as the account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerRecord {
    /// Stable customer identifier
    pub customer_id: CustomerId,

    /// Display name
    pub name: String,

    /// Contact email
    pub email: String,

    /// Contact phone, empty when not supplied
    pub phone: String,

    /// Company name, empty when not supplied
    pub company: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl CustomerRecord {
    /// Build a record with a freshly generated identifier
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
        company: impl Into<String>,
    ) -> Self {
        Self {
            customer_id: CustomerId::new(Uuid::new_v4().to_string()),
            name: name.into(),
            email: email.into(),
            phone: phone.into(),
            company: company.into(),
            created_at: Utc::now(),
        }
    }
}

/// Per-customer loyalty account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoyaltyAccount {
    /// Owning customer
    pub customer_id: CustomerId,

    /// Current point balance, never negative
    pub points: i64,

    /// Reward tier derived from points
    pub tier: Tier,

    /// Unique code other customers redeem to credit this account
    pub referral_code: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl LoyaltyAccount {
    /// Fresh account: zero points, Bronze, the supplied referral code
    pub fn open(customer_id: CustomerId, referral_code: String) -> Self {
        Self {
            customer_id,
            points: 0,
            tier: Tier::Bronze,
            referral_code,
            created_at: Utc::now(),
        }
    }
}

/// Outcome of a purchase accrual
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Accrual {
    /// Whole points earned from the purchase
    pub points_earned: i64,

    /// Tier after the accrual committed
    pub new_tier: Tier,
}

/// Outcome of a successful referral
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferralOutcome {
    /// The code owner who received the bonus
    pub referrer_id: CustomerId,

    /// Points credited
    pub bonus: i64,

    /// Referrer's balance after the credit
    pub new_balance: i64,
}
