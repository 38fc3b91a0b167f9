use crate::errors::ApiError;
use crate::metrics::METRICS;
use crate::models::{
    AccrualResponse, AccrueRequest, CreateCustomerRequest, CreateCustomerResponse,
    CustomerResponse, LoyaltyProfileResponse, RedeemRequest, RedeemResponse, ReferralResponse,
    UseReferralRequest,
};
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use loyalty_core::{CustomerId, CustomerRecord, Error as LedgerError};
use serde_json::json;

/// Health check endpoint
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "service": "loyalty-engine",
        "version": "1.0.0"
    }))
}

/// Create a customer and their loyalty account in one atomic batch
pub async fn create_customer(
    state: web::Data<AppState>,
    request: web::Json<CreateCustomerRequest>,
) -> Result<HttpResponse, ApiError> {
    METRICS.http_requests_total.inc();
    let request = request.into_inner();
    validator::Validate::validate(&request).map_err(|e| ApiError::Validation(e.to_string()))?;

    let ledger = state.ledger().await?;
    let customer = CustomerRecord::new(request.name, request.email, request.phone, request.company);
    let account = ledger.create_account(&customer).await?;

    METRICS.accounts_created_total.inc();

    Ok(HttpResponse::Created().json(CreateCustomerResponse {
        success: true,
        id: customer.customer_id.to_string(),
        referral_code: account.referral_code,
    }))
}

/// Get a customer's details
pub async fn get_customer(
    state: web::Data<AppState>,
    customer_id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    METRICS.http_requests_total.inc();
    let ledger = state.ledger().await?;
    let customer_id = CustomerId::new(customer_id.into_inner());

    let record = ledger
        .customer(&customer_id)
        .await?
        .ok_or(LedgerError::CustomerNotFound(customer_id))?;

    Ok(HttpResponse::Ok().json(CustomerResponse::from(record)))
}

/// Get the loyalty profile for a customer
pub async fn get_loyalty_profile(
    state: web::Data<AppState>,
    customer_id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    METRICS.http_requests_total.inc();
    let ledger = state.ledger().await?;
    let customer_id = CustomerId::new(customer_id.into_inner());

    let account = ledger
        .account(&customer_id)
        .await?
        .ok_or(LedgerError::AccountNotFound(customer_id))?;

    Ok(HttpResponse::Ok().json(LoyaltyProfileResponse::from(account)))
}

/// Redeem points for a reward
pub async fn redeem_points(
    state: web::Data<AppState>,
    customer_id: web::Path<String>,
    request: web::Json<RedeemRequest>,
) -> Result<HttpResponse, ApiError> {
    METRICS.http_requests_total.inc();
    let ledger = state.ledger().await?;
    let customer_id = CustomerId::new(customer_id.into_inner());
    let points_to_redeem = request.points_to_redeem;

    match ledger.redeem(&customer_id, points_to_redeem).await {
        Ok(new_points_balance) => {
            METRICS.points_redeemed_total.inc_by(points_to_redeem as f64);
            Ok(HttpResponse::Ok().json(RedeemResponse {
                success: true,
                new_points_balance,
            }))
        }
        Err(err) => {
            match err {
                LedgerError::InsufficientBalance { .. } => {
                    METRICS.insufficient_balance_total.inc()
                }
                LedgerError::TransactionConflict { .. } => {
                    METRICS.transaction_conflicts_total.inc()
                }
                _ => {}
            }
            Err(err.into())
        }
    }
}

/// Apply a referral code on behalf of the customer in the path.
/// The code owner receives the bonus.
pub async fn use_referral(
    state: web::Data<AppState>,
    customer_id: web::Path<String>,
    request: web::Json<UseReferralRequest>,
) -> Result<HttpResponse, ApiError> {
    METRICS.http_requests_total.inc();
    let ledger = state.ledger().await?;
    let customer_id = CustomerId::new(customer_id.into_inner());

    let outcome = ledger
        .apply_referral(&request.referral_code, &customer_id)
        .await?;

    METRICS.referrals_applied_total.inc();

    Ok(HttpResponse::Ok().json(ReferralResponse {
        message: format!(
            "Referral successful! User {} earned {} points.",
            outcome.referrer_id, outcome.bonus
        ),
    }))
}

/// Accrue points from a completed purchase.
/// Demonstration wrapper for the internal payment-completion call.
pub async fn accrue_points(
    state: web::Data<AppState>,
    customer_id: web::Path<String>,
    request: web::Json<AccrueRequest>,
) -> Result<HttpResponse, ApiError> {
    METRICS.http_requests_total.inc();
    let ledger = state.ledger().await?;
    let customer_id = CustomerId::new(customer_id.into_inner());

    let accrual = ledger
        .accrue_from_purchase(&customer_id, request.amount)
        .await?
        .ok_or(LedgerError::AccountNotFound(customer_id))?;

    METRICS.accruals_total.inc();

    Ok(HttpResponse::Ok().json(AccrualResponse {
        points_earned: accrual.points_earned,
        new_tier: accrual.new_tier.to_string(),
    }))
}

/// Prometheus metrics endpoint
pub async fn metrics_endpoint() -> HttpResponse {
    match METRICS.export() {
        Ok(body) => HttpResponse::Ok()
            .content_type("text/plain; version=0.0.4")
            .body(body),
        Err(e) => HttpResponse::InternalServerError().json(json!({
            "error": "Failed to gather metrics",
            "details": e.to_string()
        })),
    }
}

/// Configure routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/customer", web::post().to(create_customer))
            .route("/customer/{customer_id}", web::get().to(get_customer))
            .route("/loyalty/{customer_id}", web::get().to(get_loyalty_profile))
            .route(
                "/loyalty/{customer_id}/redeem",
                web::post().to(redeem_points),
            )
            .route(
                "/loyalty/{customer_id}/use-referral",
                web::post().to(use_referral),
            )
            .route(
                "/loyalty/{customer_id}/accrue",
                web::post().to(accrue_points),
            ),
    )
    .route("/metrics", web::get().to(metrics_endpoint))
    .route("/health", web::get().to(health_check));
}
