use chrono::{DateTime, Utc};
use loyalty_core::{CustomerRecord, LoyaltyAccount};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Customer creation request
#[derive(Debug, Deserialize, Serialize, validator::Validate)]
pub struct CreateCustomerRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub company: String,
}

/// Point redemption request
#[derive(Debug, Deserialize, Serialize)]
pub struct RedeemRequest {
    pub points_to_redeem: i64,
}

/// Referral application request
#[derive(Debug, Deserialize, Serialize)]
pub struct UseReferralRequest {
    #[serde(default)]
    pub referral_code: String,
}

/// Purchase accrual request
#[derive(Debug, Deserialize, Serialize)]
pub struct AccrueRequest {
    pub amount: Decimal,
}

/// Customer creation response
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateCustomerResponse {
    pub success: bool,
    pub id: String,
    pub referral_code: String,
}

/// Customer details response
#[derive(Debug, Serialize, Deserialize)]
pub struct CustomerResponse {
    pub customer_id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub company: String,
    pub created_at: DateTime<Utc>,
}

impl From<CustomerRecord> for CustomerResponse {
    fn from(record: CustomerRecord) -> Self {
        Self {
            customer_id: record.customer_id.to_string(),
            name: record.name,
            email: record.email,
            phone: record.phone,
            company: record.company,
            created_at: record.created_at,
        }
    }
}

/// Loyalty profile response
#[derive(Debug, Serialize, Deserialize)]
pub struct LoyaltyProfileResponse {
    pub customer_id: String,
    pub points: i64,
    pub tier: String,
    pub referral_code: String,
    pub created_at: DateTime<Utc>,
}

impl From<LoyaltyAccount> for LoyaltyProfileResponse {
    fn from(account: LoyaltyAccount) -> Self {
        Self {
            customer_id: account.customer_id.to_string(),
            points: account.points,
            tier: account.tier.to_string(),
            referral_code: account.referral_code,
            created_at: account.created_at,
        }
    }
}

/// Redemption response
#[derive(Debug, Serialize, Deserialize)]
pub struct RedeemResponse {
    pub success: bool,
    pub new_points_balance: i64,
}

/// Referral confirmation
#[derive(Debug, Serialize, Deserialize)]
pub struct ReferralResponse {
    pub message: String,
}

/// Accrual response
#[derive(Debug, Serialize, Deserialize)]
pub struct AccrualResponse {
    pub points_earned: i64,
    pub new_tier: String,
}
