//! Order query, cancellation and carrier assignment endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use domain::{AssignTracking, CancelOrder, Order, Store, Tracking, TrackingAssignment};
use serde::{Deserialize, Serialize};

use super::{parse_order_id, parse_user_id};
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CancelRequest {
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct AssignTrackingResponse {
    pub order: Order,
    pub tracking: Tracking,
}

/// GET /users/{user_id}/orders: newest first.
#[tracing::instrument(skip(state))]
pub async fn list_for_user<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<Order>>, ApiError> {
    let user_id = parse_user_id(&user_id)?;
    Ok(Json(state.orders.list_orders_for_user(user_id).await?))
}

/// GET /orders/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    let order_id = parse_order_id(&id)?;
    Ok(Json(state.orders.get_order(order_id).await?))
}

/// POST /orders/{id}/cancel
#[tracing::instrument(skip(state, payload))]
pub async fn cancel<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    payload: Result<Json<CancelRequest>, JsonRejection>,
) -> Result<Json<Order>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let Json(req) = payload?;

    let order = state
        .orders
        .cancel_order(CancelOrder::new(order_id, req.reason))
        .await?;
    Ok(Json(order))
}

/// POST /orders/{id}/tracking
#[tracing::instrument(skip(state, payload))]
pub async fn assign_tracking<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    payload: Result<Json<TrackingAssignment>, JsonRejection>,
) -> Result<Json<AssignTrackingResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let Json(assignment) = payload?;

    let (order, tracking) = state
        .orders
        .assign_tracking(AssignTracking::new(order_id, assignment))
        .await?;
    Ok(Json(AssignTrackingResponse { order, tracking }))
}

/// GET /orders/{id}/tracking
#[tracing::instrument(skip(state))]
pub async fn tracking<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Tracking>, ApiError> {
    let order_id = parse_order_id(&id)?;
    Ok(Json(state.trackings.get_by_order(order_id).await?))
}
