use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use loyalty_core::Error as LedgerError;
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ApiError>;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl ResponseError for ApiError {
    fn error_response(&self) -> HttpResponse {
        let status_code = self.status_code();

        // Unexpected internals are logged with detail and reported generically
        let message = if status_code == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "Internal error");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        HttpResponse::build(status_code).json(json!({
            "error": {
                "code": status_code.as_u16(),
                "message": message,
                "type": self.error_type()
            }
        }))
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Ledger(err) => match err {
                LedgerError::Validation(_)
                | LedgerError::InsufficientBalance { .. }
                | LedgerError::SelfReferral => StatusCode::BAD_REQUEST,
                LedgerError::AccountNotFound(_)
                | LedgerError::CustomerNotFound(_)
                | LedgerError::ReferralCodeNotFound(_) => StatusCode::NOT_FOUND,
                LedgerError::CustomerExists(_) => StatusCode::CONFLICT,
                LedgerError::StoreUnavailable(_) | LedgerError::TransactionConflict { .. } => {
                    StatusCode::SERVICE_UNAVAILABLE
                }
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl ApiError {
    fn error_type(&self) -> &str {
        match self {
            ApiError::Validation(_) => "validation_error",
            ApiError::Ledger(err) => match err {
                LedgerError::Validation(_) => "validation_error",
                LedgerError::AccountNotFound(_) => "not_found",
                LedgerError::CustomerNotFound(_) => "not_found",
                LedgerError::ReferralCodeNotFound(_) => "not_found",
                LedgerError::CustomerExists(_) => "duplicate_error",
                LedgerError::InsufficientBalance { .. } => "insufficient_balance",
                LedgerError::SelfReferral => "self_referral",
                LedgerError::TransactionConflict { .. } => "transient_conflict",
                LedgerError::StoreUnavailable(_) => "service_unavailable",
                _ => "internal_error",
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loyalty_core::CustomerId;

    #[test]
    fn business_rule_rejections_map_to_400() {
        let insufficient = ApiError::from(LedgerError::InsufficientBalance {
            requested: 60,
            available: 40,
        });
        assert_eq!(insufficient.status_code(), StatusCode::BAD_REQUEST);

        let self_referral = ApiError::from(LedgerError::SelfReferral);
        assert_eq!(self_referral.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn missing_resources_map_to_404() {
        let account = ApiError::from(LedgerError::AccountNotFound(CustomerId::new("c-1")));
        assert_eq!(account.status_code(), StatusCode::NOT_FOUND);

        let code = ApiError::from(LedgerError::ReferralCodeNotFound("X-0000".to_string()));
        assert_eq!(code.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn transient_failures_map_to_503() {
        let conflict = ApiError::from(LedgerError::TransactionConflict { attempts: 5 });
        assert_eq!(conflict.status_code(), StatusCode::SERVICE_UNAVAILABLE);

        let unavailable = ApiError::from(LedgerError::StoreUnavailable("no data dir".to_string()));
        assert_eq!(unavailable.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn internals_map_to_500() {
        let storage = ApiError::from(LedgerError::Storage("disk on fire".to_string()));
        assert_eq!(storage.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
