//! Loyalty ledger operations
//!
//! Ties the account model to the store seam. Every mutation is either a
//! bounded compare-and-swap loop (`redeem`, `accrue_from_purchase`) or a
//! blind atomic increment (`apply_referral`), so concurrent writers on the
//! same account serialize at the store and the balance never goes negative.
//!
//! Tier is recomputed from the point total only inside
//! [`LoyaltyLedger::accrue_from_purchase`]. Redemption never demotes a tier,
//! and a referral bonus that crosses a threshold is not reflected in the
//! stored tier until the next purchase accrual.
//!
//! # Example
//!
//! ```no_run
//! use loyalty_core::{Config, CustomerRecord, LoyaltyLedger, MemoryStore};
//! use std::sync::Arc;
//!
//! # async fn run() -> loyalty_core::Result<()> {
//! let ledger = LoyaltyLedger::new(Arc::new(MemoryStore::new()), Config::default());
//! let customer = CustomerRecord::new("Kaveri Rao", "kaveri@example.com", "", "");
//! let account = ledger.create_account(&customer).await?;
//! println!("referral code: {}", account.referral_code);
//! # Ok(())
//! # }
//! ```

use crate::config::Config;
use crate::error::{Error, Result};
use crate::referral::generate_referral_code;
use crate::store::{AccountStore, CasOutcome};
use crate::types::{
    Accrual, CustomerId, CustomerRecord, LoyaltyAccount, ReferralOutcome, Tier, REFERRAL_BONUS,
};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, warn};

/// Main ledger interface
pub struct LoyaltyLedger {
    store: Arc<dyn AccountStore>,
    config: Config,
}

impl LoyaltyLedger {
    /// Create a ledger over an explicit store handle
    pub fn new(store: Arc<dyn AccountStore>, config: Config) -> Self {
        Self { store, config }
    }

    /// Create a customer and their loyalty account as one atomic unit.
    ///
    /// The account starts at zero points in Bronze with a referral code
    /// derived from the display name. A code collision regenerates the
    /// suffix up to `referral.max_code_attempts` times.
    pub async fn create_account(&self, customer: &CustomerRecord) -> Result<LoyaltyAccount> {
        if customer.name.trim().is_empty() {
            return Err(Error::Validation("Name is required".to_string()));
        }
        if customer.email.trim().is_empty() {
            return Err(Error::Validation("Email is required".to_string()));
        }

        let mut attempts = 0;
        loop {
            let code = generate_referral_code(&customer.name);
            let account = LoyaltyAccount::open(customer.customer_id.clone(), code);
            match self.store.create_customer(customer, &account).await {
                Ok(()) => {
                    info!(
                        customer_id = %customer.customer_id,
                        referral_code = %account.referral_code,
                        "Created loyalty account"
                    );
                    return Ok(account);
                }
                Err(Error::DuplicateReferralCode(code)) => {
                    attempts += 1;
                    if attempts >= self.config.referral.max_code_attempts {
                        return Err(Error::DuplicateReferralCode(code));
                    }
                    warn!(%code, "Referral code collision, regenerating");
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Spend points from an account.
    ///
    /// Runs as a compare-and-swap transaction: a balance shorter than the
    /// requested amount aborts with `InsufficientBalance` and writes
    /// nothing. Returns the new balance. The stored tier is left untouched.
    pub async fn redeem(&self, customer_id: &CustomerId, points_to_redeem: i64) -> Result<i64> {
        if points_to_redeem <= 0 {
            return Err(Error::Validation(
                "points_to_redeem must be a positive integer".to_string(),
            ));
        }

        let max_attempts = self.config.transaction.max_attempts;
        for _ in 0..max_attempts {
            let current = self
                .store
                .get_account(customer_id)
                .await?
                .ok_or_else(|| Error::AccountNotFound(customer_id.clone()))?;

            if current.doc.points < points_to_redeem {
                return Err(Error::InsufficientBalance {
                    requested: points_to_redeem,
                    available: current.doc.points,
                });
            }

            let mut updated = current.doc;
            updated.points -= points_to_redeem;

            match self.store.compare_and_swap(current.version, &updated).await? {
                CasOutcome::Committed(_) => {
                    info!(
                        customer_id = %customer_id,
                        redeemed = points_to_redeem,
                        balance = updated.points,
                        "Redeemed points"
                    );
                    return Ok(updated.points);
                }
                CasOutcome::Conflict => continue,
            }
        }

        Err(Error::TransactionConflict {
            attempts: max_attempts,
        })
    }

    /// Apply a referral code on behalf of a new customer.
    ///
    /// Credits the code owner with [`REFERRAL_BONUS`] points via the store's
    /// atomic increment. A customer cannot apply their own code.
    pub async fn apply_referral(
        &self,
        code: &str,
        new_customer_id: &CustomerId,
    ) -> Result<ReferralOutcome> {
        if code.trim().is_empty() {
            return Err(Error::Validation("Referral code required".to_string()));
        }

        let referrer = self
            .store
            .find_by_referral_code(code)
            .await?
            .ok_or_else(|| Error::ReferralCodeNotFound(code.to_string()))?;

        if referrer.customer_id == *new_customer_id {
            return Err(Error::SelfReferral);
        }

        let new_balance = self
            .store
            .increment_points(&referrer.customer_id, REFERRAL_BONUS)
            .await?
            .ok_or_else(|| Error::ReferralCodeNotFound(code.to_string()))?;

        info!(
            referrer = %referrer.customer_id,
            bonus = REFERRAL_BONUS,
            "Applied referral bonus"
        );

        Ok(ReferralOutcome {
            referrer_id: referrer.customer_id,
            bonus: REFERRAL_BONUS,
            new_balance,
        })
    }

    /// Convert a purchase into points and refresh the tier.
    ///
    /// One point per whole unit of currency (floor conversion). The tier is
    /// recomputed from the new total inside the same transaction. Returns
    /// `Ok(None)` when the customer has no loyalty account; callers decide
    /// how to surface that.
    pub async fn accrue_from_purchase(
        &self,
        customer_id: &CustomerId,
        amount: Decimal,
    ) -> Result<Option<Accrual>> {
        if amount <= Decimal::ZERO {
            return Err(Error::Validation(
                "Purchase amount must be positive".to_string(),
            ));
        }
        let points_earned = amount
            .floor()
            .to_i64()
            .ok_or_else(|| Error::Validation("Purchase amount out of range".to_string()))?;

        let max_attempts = self.config.transaction.max_attempts;
        for _ in 0..max_attempts {
            let current = match self.store.get_account(customer_id).await? {
                Some(v) => v,
                None => return Ok(None),
            };

            let mut updated = current.doc;
            updated.points += points_earned;
            let new_tier = Tier::for_points(updated.points);
            let upgraded = new_tier != updated.tier;
            updated.tier = new_tier;

            match self.store.compare_and_swap(current.version, &updated).await? {
                CasOutcome::Committed(_) => {
                    if upgraded {
                        info!(customer_id = %customer_id, tier = %new_tier, "Tier upgrade");
                    }
                    return Ok(Some(Accrual {
                        points_earned,
                        new_tier,
                    }));
                }
                CasOutcome::Conflict => continue,
            }
        }

        Err(Error::TransactionConflict {
            attempts: max_attempts,
        })
    }

    /// Read an account
    pub async fn account(&self, customer_id: &CustomerId) -> Result<Option<LoyaltyAccount>> {
        Ok(self
            .store
            .get_account(customer_id)
            .await?
            .map(|versioned| versioned.doc))
    }

    /// Read a customer record
    pub async fn customer(&self, customer_id: &CustomerId) -> Result<Option<CustomerRecord>> {
        self.store.get_customer(customer_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn test_ledger() -> LoyaltyLedger {
        LoyaltyLedger::new(Arc::new(MemoryStore::new()), Config::default())
    }

    async fn customer_with_account(ledger: &LoyaltyLedger, name: &str) -> (CustomerId, String) {
        let customer = CustomerRecord::new(name, format!("{}@example.com", name), "", "");
        let account = ledger.create_account(&customer).await.unwrap();
        (customer.customer_id, account.referral_code)
    }

    #[tokio::test]
    async fn create_account_starts_at_bronze_zero() {
        let ledger = test_ledger();
        let (id, code) = customer_with_account(&ledger, "Kaveri Rao").await;

        let account = ledger.account(&id).await.unwrap().unwrap();
        assert_eq!(account.points, 0);
        assert_eq!(account.tier, Tier::Bronze);
        assert!(code.starts_with("KAVER-"));
    }

    #[tokio::test]
    async fn create_account_requires_name_and_email() {
        let ledger = test_ledger();

        let no_name = CustomerRecord::new("", "a@example.com", "", "");
        assert!(matches!(
            ledger.create_account(&no_name).await.unwrap_err(),
            Error::Validation(_)
        ));

        let no_email = CustomerRecord::new("Alice", "   ", "", "");
        assert!(matches!(
            ledger.create_account(&no_email).await.unwrap_err(),
            Error::Validation(_)
        ));
    }

    #[tokio::test]
    async fn redeem_decrements_balance() {
        let ledger = test_ledger();
        let (id, _) = customer_with_account(&ledger, "Alice").await;
        ledger
            .accrue_from_purchase(&id, Decimal::from(100))
            .await
            .unwrap();

        let balance = ledger.redeem(&id, 60).await.unwrap();
        assert_eq!(balance, 40);
        assert_eq!(ledger.account(&id).await.unwrap().unwrap().points, 40);
    }

    #[tokio::test]
    async fn redeem_insufficient_balance_leaves_balance_unchanged() {
        let ledger = test_ledger();
        let (id, _) = customer_with_account(&ledger, "Alice").await;
        ledger
            .accrue_from_purchase(&id, Decimal::from(50))
            .await
            .unwrap();

        let err = ledger.redeem(&id, 60).await.unwrap_err();
        assert!(matches!(
            err,
            Error::InsufficientBalance {
                requested: 60,
                available: 50
            }
        ));
        assert_eq!(ledger.account(&id).await.unwrap().unwrap().points, 50);
    }

    #[tokio::test]
    async fn redeem_rejects_non_positive_input_before_store_access() {
        let ledger = test_ledger();

        // No account exists at all: validation must fire first
        let ghost = CustomerId::new("ghost");
        assert!(matches!(
            ledger.redeem(&ghost, 0).await.unwrap_err(),
            Error::Validation(_)
        ));
        assert!(matches!(
            ledger.redeem(&ghost, -5).await.unwrap_err(),
            Error::Validation(_)
        ));
    }

    #[tokio::test]
    async fn redeem_unknown_account_is_not_found() {
        let ledger = test_ledger();
        assert!(matches!(
            ledger.redeem(&CustomerId::new("ghost"), 10).await.unwrap_err(),
            Error::AccountNotFound(_)
        ));
    }

    #[tokio::test]
    async fn referral_credits_the_code_owner() {
        let ledger = test_ledger();
        let (referrer, code) = customer_with_account(&ledger, "Alice").await;
        let (newcomer, _) = customer_with_account(&ledger, "Bob").await;

        let outcome = ledger.apply_referral(&code, &newcomer).await.unwrap();
        assert_eq!(outcome.referrer_id, referrer);
        assert_eq!(outcome.bonus, REFERRAL_BONUS);
        assert_eq!(outcome.new_balance, 100);

        assert_eq!(ledger.account(&referrer).await.unwrap().unwrap().points, 100);
        assert_eq!(ledger.account(&newcomer).await.unwrap().unwrap().points, 0);
    }

    #[tokio::test]
    async fn referral_unknown_code_mutates_nothing() {
        let ledger = test_ledger();
        let (id, _) = customer_with_account(&ledger, "Alice").await;

        assert!(matches!(
            ledger
                .apply_referral("NOONE-0000", &id)
                .await
                .unwrap_err(),
            Error::ReferralCodeNotFound(_)
        ));
        assert_eq!(ledger.account(&id).await.unwrap().unwrap().points, 0);
    }

    #[tokio::test]
    async fn self_referral_rejected() {
        let ledger = test_ledger();
        let (id, code) = customer_with_account(&ledger, "Alice").await;

        assert!(matches!(
            ledger.apply_referral(&code, &id).await.unwrap_err(),
            Error::SelfReferral
        ));
        assert_eq!(ledger.account(&id).await.unwrap().unwrap().points, 0);
    }

    #[tokio::test]
    async fn referral_requires_a_code() {
        let ledger = test_ledger();
        assert!(matches!(
            ledger
                .apply_referral("", &CustomerId::new("c-1"))
                .await
                .unwrap_err(),
            Error::Validation(_)
        ));
    }

    #[tokio::test]
    async fn accrual_walks_through_tiers() {
        let ledger = test_ledger();
        let (id, _) = customer_with_account(&ledger, "Alice").await;

        let accrual = ledger
            .accrue_from_purchase(&id, Decimal::from(500))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(accrual.points_earned, 500);
        assert_eq!(accrual.new_tier, Tier::Silver);

        let accrual = ledger
            .accrue_from_purchase(&id, Decimal::from(1500))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(accrual.points_earned, 1500);
        assert_eq!(accrual.new_tier, Tier::Gold);

        let account = ledger.account(&id).await.unwrap().unwrap();
        assert_eq!(account.points, 2000);
        assert_eq!(account.tier, Tier::Gold);
    }

    #[tokio::test]
    async fn accrual_floors_fractional_amounts() {
        let ledger = test_ledger();
        let (id, _) = customer_with_account(&ledger, "Alice").await;

        let accrual = ledger
            .accrue_from_purchase(&id, Decimal::new(1999, 2)) // 19.99
            .await
            .unwrap()
            .unwrap();
        assert_eq!(accrual.points_earned, 19);
    }

    #[tokio::test]
    async fn accrual_without_account_is_soft_none() {
        let ledger = test_ledger();
        let result = ledger
            .accrue_from_purchase(&CustomerId::new("ghost"), Decimal::from(100))
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn accrual_rejects_non_positive_amount() {
        let ledger = test_ledger();
        let (id, _) = customer_with_account(&ledger, "Alice").await;

        assert!(matches!(
            ledger
                .accrue_from_purchase(&id, Decimal::ZERO)
                .await
                .unwrap_err(),
            Error::Validation(_)
        ));
        assert!(matches!(
            ledger
                .accrue_from_purchase(&id, Decimal::from(-10))
                .await
                .unwrap_err(),
            Error::Validation(_)
        ));
    }

    #[tokio::test]
    async fn referral_bonus_does_not_change_tier_until_next_accrual() {
        let ledger = test_ledger();
        let (referrer, code) = customer_with_account(&ledger, "Alice").await;
        let (newcomer, _) = customer_with_account(&ledger, "Bob").await;

        ledger
            .accrue_from_purchase(&referrer, Decimal::from(450))
            .await
            .unwrap();

        // 450 + 100 = 550 crosses the Silver threshold, but only the
        // balance moves; the stored tier stays Bronze until a purchase
        // accrual recomputes it.
        ledger.apply_referral(&code, &newcomer).await.unwrap();
        let account = ledger.account(&referrer).await.unwrap().unwrap();
        assert_eq!(account.points, 550);
        assert_eq!(account.tier, Tier::Bronze);

        ledger
            .accrue_from_purchase(&referrer, Decimal::from(1))
            .await
            .unwrap();
        let account = ledger.account(&referrer).await.unwrap().unwrap();
        assert_eq!(account.points, 551);
        assert_eq!(account.tier, Tier::Silver);
    }

    #[tokio::test]
    async fn redemption_never_demotes_tier() {
        let ledger = test_ledger();
        let (id, _) = customer_with_account(&ledger, "Alice").await;
        ledger
            .accrue_from_purchase(&id, Decimal::from(600))
            .await
            .unwrap();

        ledger.redeem(&id, 550).await.unwrap();
        let account = ledger.account(&id).await.unwrap().unwrap();
        assert_eq!(account.points, 50);
        assert_eq!(account.tier, Tier::Silver);
    }

    #[tokio::test]
    async fn concurrent_redemptions_exactly_one_succeeds() {
        let ledger = Arc::new(test_ledger());
        let (id, _) = customer_with_account(&ledger, "Alice").await;
        ledger
            .accrue_from_purchase(&id, Decimal::from(100))
            .await
            .unwrap();

        let a = {
            let ledger = ledger.clone();
            let id = id.clone();
            tokio::spawn(async move { ledger.redeem(&id, 60).await })
        };
        let b = {
            let ledger = ledger.clone();
            let id = id.clone();
            tokio::spawn(async move { ledger.redeem(&id, 60).await })
        };

        let results = [a.await.unwrap(), b.await.unwrap()];
        let successes: Vec<_> = results.iter().filter(|r| r.is_ok()).collect();
        let failures: Vec<_> = results.iter().filter(|r| r.is_err()).collect();

        assert_eq!(successes.len(), 1);
        assert_eq!(*successes[0].as_ref().unwrap(), 40);
        assert_eq!(failures.len(), 1);
        assert!(matches!(
            failures[0].as_ref().unwrap_err(),
            Error::InsufficientBalance { .. }
        ));

        let account = ledger.account(&id).await.unwrap().unwrap();
        assert_eq!(account.points, 40);
    }
}
