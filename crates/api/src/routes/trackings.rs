//! Shipment tracking endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use domain::{
    Store, Tracking, TrackingDetailsUpdate, TrackingNotification, TrackingStatus,
    TrackingStatusUpdate,
};
use serde::{Deserialize, Serialize};

use super::parse_tracking_id;
use crate::boolean::deserialize_optional_loose_bool;
use crate::error::ApiError;
use crate::state::AppState;

/// Filters for `GET /trackings`.
///
/// Without `status` the active trackings are listed. `active` narrows a
/// status listing to active or inactive records.
#[derive(Debug, Default, Deserialize)]
pub struct TrackingQuery {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_loose_bool")]
    pub active: Option<bool>,
}

/// Body of `PATCH /trackings/{id}`. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TrackingDetailsRequest {
    pub carrier_name: Option<String>,
    pub carrier_phone: Option<String>,
    pub estimated_delivery_date: Option<DateTime<Utc>>,
    pub current_location: Option<String>,
    pub notes: Option<String>,
    #[serde(deserialize_with = "deserialize_optional_loose_bool")]
    pub is_active: Option<bool>,
}

impl From<TrackingDetailsRequest> for TrackingDetailsUpdate {
    fn from(req: TrackingDetailsRequest) -> Self {
        Self {
            carrier_name: req.carrier_name,
            carrier_phone: req.carrier_phone,
            estimated_delivery_date: req.estimated_delivery_date,
            current_location: req.current_location,
            notes: req.notes,
            is_active: req.is_active,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatusChangeResponse {
    pub tracking: Tracking,
    pub notification: TrackingNotification,
}

/// GET /trackings?status=&active=
#[tracing::instrument(skip(state, query))]
pub async fn list<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    query: Result<Query<TrackingQuery>, QueryRejection>,
) -> Result<Json<Vec<Tracking>>, ApiError> {
    let Query(query) = query?;

    let trackings = match query.status.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => {
            let status: TrackingStatus = raw.parse().map_err(ApiError::BadRequest)?;
            let mut trackings = state.trackings.list_by_status(status).await?;
            if let Some(active) = query.active {
                trackings.retain(|t| t.is_active == active);
            }
            trackings
        }
        _ => state.trackings.list_active().await?,
    };
    Ok(Json(trackings))
}

/// GET /trackings/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Tracking>, ApiError> {
    let tracking_id = parse_tracking_id(&id)?;
    Ok(Json(state.trackings.get(tracking_id).await?))
}

/// GET /trackings/number/{tracking_number}
#[tracing::instrument(skip(state))]
pub async fn get_by_number<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(tracking_number): Path<String>,
) -> Result<Json<Tracking>, ApiError> {
    Ok(Json(state.trackings.get_by_number(tracking_number.trim()).await?))
}

/// PATCH /trackings/{id}
#[tracing::instrument(skip(state, payload))]
pub async fn update_details<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    payload: Result<Json<TrackingDetailsRequest>, JsonRejection>,
) -> Result<Json<Tracking>, ApiError> {
    let tracking_id = parse_tracking_id(&id)?;
    let Json(req) = payload?;

    let tracking = state
        .trackings
        .update_details(tracking_id, req.into())
        .await?;
    Ok(Json(tracking))
}

/// PUT /trackings/{id}/status
#[tracing::instrument(skip(state, payload))]
pub async fn update_status<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    payload: Result<Json<TrackingStatusUpdate>, JsonRejection>,
) -> Result<Json<StatusChangeResponse>, ApiError> {
    let tracking_id = parse_tracking_id(&id)?;
    let Json(update) = payload?;

    let (tracking, notification) = state.trackings.update_status(tracking_id, update).await?;
    Ok(Json(StatusChangeResponse {
        tracking,
        notification,
    }))
}

/// DELETE /trackings/{id}
#[tracing::instrument(skip(state))]
pub async fn delete<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let tracking_id = parse_tracking_id(&id)?;
    state.trackings.delete(tracking_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
