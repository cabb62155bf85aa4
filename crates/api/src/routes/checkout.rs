//! Direct checkout of a product list.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use checkout::{CheckoutReceipt, CheckoutRequest};
use domain::Store;

use crate::error::ApiError;
use crate::state::AppState;

/// POST /checkout
#[tracing::instrument(skip(state, payload))]
pub async fn create<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<CheckoutRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CheckoutReceipt>), ApiError> {
    let Json(req) = payload?;
    let receipt = state.checkout.checkout(req).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}
