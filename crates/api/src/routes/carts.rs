//! Cart endpoints, scoped to a user.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use checkout::{CartCheckout, CheckoutReceipt};
use domain::{AddCartItem, Cart, RemoveCartItem, Store, UpdateCartItem};
use serde::Deserialize;

use super::parse_user_id;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: String,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub quantity: i64,
}

/// GET /users/{user_id}/cart
#[tracing::instrument(skip(state))]
pub async fn get<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(user_id): Path<String>,
) -> Result<Json<Cart>, ApiError> {
    let user_id = parse_user_id(&user_id)?;
    Ok(Json(state.carts.get_cart(user_id).await?))
}

/// POST /users/{user_id}/cart/items
#[tracing::instrument(skip(state, payload))]
pub async fn add_item<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(user_id): Path<String>,
    payload: Result<Json<AddItemRequest>, JsonRejection>,
) -> Result<Json<Cart>, ApiError> {
    let user_id = parse_user_id(&user_id)?;
    let Json(req) = payload?;
    if req.product_id.trim().is_empty() {
        return Err(ApiError::BadRequest("product_id is required".to_string()));
    }

    let cart = state
        .carts
        .add_item(AddCartItem::new(user_id, req.product_id.trim(), req.quantity))
        .await?;
    Ok(Json(cart))
}

/// PUT /users/{user_id}/cart/items/{product_id}
#[tracing::instrument(skip(state, payload))]
pub async fn update_item<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path((user_id, product_id)): Path<(String, String)>,
    payload: Result<Json<UpdateItemRequest>, JsonRejection>,
) -> Result<Json<Cart>, ApiError> {
    let user_id = parse_user_id(&user_id)?;
    let Json(req) = payload?;

    let cart = state
        .carts
        .update_quantity(UpdateCartItem::new(user_id, product_id, req.quantity))
        .await?;
    Ok(Json(cart))
}

/// DELETE /users/{user_id}/cart/items/{product_id}
#[tracing::instrument(skip(state))]
pub async fn remove_item<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path((user_id, product_id)): Path<(String, String)>,
) -> Result<Json<Cart>, ApiError> {
    let user_id = parse_user_id(&user_id)?;
    let cart = state
        .carts
        .remove_item(RemoveCartItem::new(user_id, product_id))
        .await?;
    Ok(Json(cart))
}

/// DELETE /users/{user_id}/cart
#[tracing::instrument(skip(state))]
pub async fn clear<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(user_id): Path<String>,
) -> Result<Json<Cart>, ApiError> {
    let user_id = parse_user_id(&user_id)?;
    Ok(Json(state.carts.clear_cart(user_id).await?))
}

/// POST /users/{user_id}/cart/checkout
#[tracing::instrument(skip(state, payload))]
pub async fn checkout<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(user_id): Path<String>,
    payload: Result<Json<CartCheckout>, JsonRejection>,
) -> Result<(StatusCode, Json<CheckoutReceipt>), ApiError> {
    let user_id = parse_user_id(&user_id)?;
    let Json(req) = payload?;

    let receipt = state.checkout.checkout_cart(user_id, req).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}
