//! Checkout coordinator for turning carts and product lists into orders.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use common::UserId;
use domain::{
    CancelOrder, Cart, CartService, DomainError, Notification, NotificationSink,
    Order, OrderConfirmation, OrderError, OrderLine, OrderService, ShippingPolicy,
    StockDecrement, Store, Tracking, TrackingService, UserLockGuard, price_line,
    publish_best_effort,
};

use crate::error::{CheckoutError, Result};
use crate::journal::{CheckoutJournal, CompletedAction};
use crate::request::{CartCheckout, CheckoutReceipt, CheckoutRequest};
use crate::state::CheckoutStep;

type StepResult<T> = std::result::Result<T, (CheckoutStep, DomainError)>;

fn failed_at<E: Into<DomainError>>(
    step: CheckoutStep,
) -> impl FnOnce(E) -> (CheckoutStep, DomainError) {
    move |e| (step, e.into())
}

/// Orchestrates checkouts.
///
/// Validation runs before anything is written. The writes then run as a
/// journaled unit of work (order → stock → cart → tracking) and completed
/// writes are compensated if a later one fails.
pub struct CheckoutCoordinator<S: Store, N: NotificationSink> {
    store: S,
    carts: Arc<CartService<S>>,
    orders: OrderService<S>,
    trackings: TrackingService<S, N>,
    policy: ShippingPolicy,
}

impl<S: Store, N: NotificationSink> CheckoutCoordinator<S, N> {
    /// Creates a coordinator sharing `carts` (and its user locks) with the
    /// rest of the application.
    pub fn new(store: S, carts: Arc<CartService<S>>, notifier: N) -> Self {
        Self {
            orders: OrderService::new(store.clone()),
            trackings: TrackingService::new(store.clone(), notifier),
            store,
            carts,
            policy: ShippingPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: ShippingPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Replaces the tracking service, e.g. to plug in a number generator.
    pub fn with_tracking_service(mut self, trackings: TrackingService<S, N>) -> Self {
        self.trackings = trackings;
        self
    }

    pub fn carts(&self) -> &Arc<CartService<S>> {
        &self.carts
    }

    pub fn policy(&self) -> &ShippingPolicy {
        &self.policy
    }

    /// Checks out an explicit product list against the live catalog.
    #[tracing::instrument(skip(self, request), fields(user_id = ?request.user_id))]
    pub async fn checkout(&self, request: CheckoutRequest) -> Result<CheckoutReceipt> {
        metrics::counter!("checkout_total", "source" => "direct").increment(1);

        let draft = request.into_draft();
        let user_id = draft.validate_header().map_err(DomainError::from)?;

        let requested = draft.merged_lines();
        let mut lines = Vec::with_capacity(requested.len());
        for line in &requested {
            let product = self
                .store
                .find_product(&line.product_id)
                .await
                .map_err(DomainError::from)?;
            lines.push(price_line(line, product.as_ref()).map_err(DomainError::from)?);
        }

        let order = Order::place(user_id, lines, draft.details, &self.policy, Utc::now());
        self.execute(order, None).await
    }

    /// Checks out the user's active cart at its captured prices.
    ///
    /// The user's cart lock is held for the whole checkout.
    #[tracing::instrument(skip(self, checkout))]
    pub async fn checkout_cart(
        &self,
        user_id: UserId,
        checkout: CartCheckout,
    ) -> Result<CheckoutReceipt> {
        metrics::counter!("checkout_total", "source" => "cart").increment(1);

        let details = checkout.into_details();
        let guard = self.carts.lock_user(user_id).await;
        let cart = self.carts.prepare_checkout(&guard, &details).await?;

        let lines: Vec<OrderLine> = cart.items().iter().map(OrderLine::from_cart_item).collect();
        let order = Order::place(user_id, lines, details, &self.policy, Utc::now());
        if order.subtotal != cart.total_amount() {
            return Err(DomainError::from(OrderError::TotalMismatch {
                order_subtotal: order.subtotal,
                cart_total: cart.total_amount(),
            })
            .into());
        }

        self.execute(order, Some((&guard, cart))).await
    }

    async fn execute(
        &self,
        order: Order,
        cart: Option<(&UserLockGuard, Cart)>,
    ) -> Result<CheckoutReceipt> {
        let started = Instant::now();
        let guard = cart.as_ref().map(|(guard, _)| *guard);
        let mut journal = CheckoutJournal::new();

        let outcome = self.run_steps(&mut journal, &order, cart).await;
        metrics::histogram!("checkout_duration_seconds").record(started.elapsed().as_secs_f64());

        match outcome {
            Ok(tracking) => {
                journal.complete();
                metrics::counter!("checkout_completed").increment(1);
                tracing::info!(
                    order_id = %order.id,
                    order_number = %order.order_number,
                    total = %order.total_amount,
                    "checkout completed"
                );

                let confirmation = OrderConfirmation::for_order(
                    &order,
                    Some(tracking.tracking_number.clone()),
                    Utc::now(),
                );
                publish_best_effort(
                    self.trackings.notifier(),
                    Notification::OrderConfirmed(confirmation),
                )
                .await;

                Ok(CheckoutReceipt {
                    summary: order.summary(),
                    order,
                    tracking,
                })
            }
            Err((step, source)) => {
                tracing::warn!(%step, error = %source, "checkout step failed, compensating");
                self.compensate(&mut journal, step, guard).await;
                metrics::counter!("checkout_failed", "step" => step.as_str()).increment(1);
                Err(CheckoutError::StepFailed { step, source })
            }
        }
    }

    async fn run_steps(
        &self,
        journal: &mut CheckoutJournal,
        order: &Order,
        cart: Option<(&UserLockGuard, Cart)>,
    ) -> StepResult<Tracking> {
        journal.start(CheckoutStep::CreateOrder);
        let order = self
            .store
            .create_order(order)
            .await
            .map_err(failed_at(CheckoutStep::CreateOrder))?;
        journal.record(CompletedAction::OrderCreated { order_id: order.id });

        journal.start(CheckoutStep::DecrementStock);
        for line in &order.lines {
            let decrement = self
                .store
                .decrease_stock(&line.product_id, line.quantity)
                .await
                .map_err(failed_at(CheckoutStep::DecrementStock))?;

            match decrement {
                StockDecrement::Applied { remaining } => {
                    tracing::debug!(product_id = %line.product_id, remaining, "stock decremented");
                    journal.record(CompletedAction::StockDecremented {
                        product_id: line.product_id.clone(),
                        quantity: line.quantity,
                    });
                }
                StockDecrement::Insufficient { available } => {
                    return Err((
                        CheckoutStep::DecrementStock,
                        OrderError::InsufficientStock {
                            product_id: line.product_id.to_string(),
                            requested: line.quantity,
                            available,
                        }
                        .into(),
                    ));
                }
                StockDecrement::NotFound => {
                    return Err((
                        CheckoutStep::DecrementStock,
                        OrderError::ProductNotFound {
                            product_id: line.product_id.to_string(),
                        }
                        .into(),
                    ));
                }
            }
        }

        if let Some((guard, mut cart)) = cart {
            journal.start(CheckoutStep::CompleteCart);
            let snapshot = cart.clone();
            self.carts
                .complete_checkout(guard, &mut cart)
                .await
                .map_err(failed_at(CheckoutStep::CompleteCart))?;
            journal.record(CompletedAction::CartCompleted { snapshot });
        }

        journal.start(CheckoutStep::InitializeTracking);
        self.trackings
            .initialize_for_order(&order)
            .await
            .map_err(failed_at(CheckoutStep::InitializeTracking))
    }

    /// Undoes completed actions, most recent first. A failing compensation
    /// is logged and counted; the remaining ones still run.
    async fn compensate(
        &self,
        journal: &mut CheckoutJournal,
        failed_step: CheckoutStep,
        guard: Option<&UserLockGuard>,
    ) {
        for action in journal.begin_compensation(failed_step) {
            let result = match &action {
                CompletedAction::CartCompleted { snapshot } => match guard {
                    Some(guard) => self.carts.restore_cart(guard, snapshot).await,
                    None => Ok(()),
                },
                CompletedAction::StockDecremented {
                    product_id,
                    quantity,
                } => self
                    .store
                    .increase_stock(product_id, *quantity)
                    .await
                    .map_err(DomainError::from),
                CompletedAction::OrderCreated { order_id } => self
                    .orders
                    .cancel_order(CancelOrder::new(
                        *order_id,
                        format!("checkout failed: {failed_step}"),
                    ))
                    .await
                    .map(|_| ()),
            };

            if let Err(e) = result {
                metrics::counter!("checkout_compensations_failed").increment(1);
                tracing::error!(?action, error = %e, "checkout compensation failed");
            }
        }

        journal.fail();
        tracing::info!(%failed_step, "checkout compensated");
    }
}
