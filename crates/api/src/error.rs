//! API error types with HTTP response mapping.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use checkout::CheckoutError;
use domain::{CartError, DomainError, OrderError, StoreError, TrackingError};
use serde::Serialize;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Malformed request input.
    BadRequest(String),
    /// Domain logic error.
    Domain(DomainError),
    /// Checkout error, possibly after compensation.
    Checkout(CheckoutError),
}

/// Body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub status: u16,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Domain(err) => (domain_status(&err), err.to_string()),
            ApiError::Checkout(err) => (domain_status(err.domain_error()), err.to_string()),
        };

        metrics::counter!("api_errors_total", "status" => status.as_u16().to_string()).increment(1);
        if status.is_server_error() {
            tracing::error!(error = %message, "internal server error");
        }

        let body = ErrorBody {
            status: status.as_u16(),
            message,
        };
        (status, axum::Json(body)).into_response()
    }
}

fn domain_status(err: &DomainError) -> StatusCode {
    match err {
        DomainError::Cart(cart_err) => match cart_err {
            CartError::Expired { .. } => StatusCode::GONE,
            CartError::ItemNotFound { .. }
            | CartError::ItemNotInCart { .. }
            | CartError::ProductNotFound { .. } => StatusCode::NOT_FOUND,
            CartError::NotActive { .. }
            | CartError::InvalidQuantity { .. }
            | CartError::StockExceeded { .. }
            | CartError::EmptyCart
            | CartError::AlreadyEmpty
            | CartError::InsufficientStock { .. } => StatusCode::BAD_REQUEST,
        },
        DomainError::Order(order_err) => match order_err {
            OrderError::ProductNotFound { .. } => StatusCode::NOT_FOUND,
            OrderError::TotalMismatch { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        },
        DomainError::Tracking(tracking_err) => match tracking_err {
            TrackingError::DuplicateTrackingNumber { .. } => StatusCode::CONFLICT,
            TrackingError::GenerationExhausted { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            TrackingError::InvalidTransition { .. }
            | TrackingError::Inactive { .. }
            | TrackingError::Locked { .. }
            | TrackingError::NotDeletable { .. } => StatusCode::BAD_REQUEST,
        },
        DomainError::Store(store_err) => match store_err {
            StoreError::Conflict(_) => StatusCode::CONFLICT,
            StoreError::NotFound { .. } => StatusCode::NOT_FOUND,
            StoreError::Backend(_) => StatusCode::INTERNAL_SERVER_ERROR,
        },
        DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        ApiError::Checkout(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use checkout::CheckoutStep;
    use domain::TrackingStatus;

    fn status_of(err: ApiError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_cart_errors() {
        assert_eq!(
            status_of(DomainError::from(CartError::Expired {
                cart_id: "c".to_string(),
                expired_at: chrono::Utc::now(),
            })
            .into()),
            StatusCode::GONE
        );
        assert_eq!(
            status_of(DomainError::from(CartError::EmptyCart).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(
                DomainError::from(CartError::ItemNotFound {
                    product_id: "SKU-001".to_string()
                })
                .into()
            ),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_tracking_errors() {
        assert_eq!(
            status_of(
                DomainError::from(TrackingError::InvalidTransition {
                    from: TrackingStatus::Pending,
                    to: TrackingStatus::Delivered,
                })
                .into()
            ),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(
                DomainError::from(TrackingError::DuplicateTrackingNumber {
                    tracking_number: "TRK1".to_string()
                })
                .into()
            ),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(DomainError::from(TrackingError::GenerationExhausted { attempts: 5 }).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_store_and_lookup_errors() {
        assert_eq!(
            status_of(DomainError::from(StoreError::Conflict("dup".to_string())).into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(DomainError::not_found("Order", "42").into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(ApiError::BadRequest("bad id".to_string())),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_step_failure_uses_cause() {
        let err = CheckoutError::StepFailed {
            step: CheckoutStep::DecrementStock,
            source: OrderError::InsufficientStock {
                product_id: "SKU-001".to_string(),
                requested: 2,
                available: 1,
            }
            .into(),
        };
        assert_eq!(status_of(err.into()), StatusCode::BAD_REQUEST);
    }
}
