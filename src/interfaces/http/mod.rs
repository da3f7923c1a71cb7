//! The storefront HTTP API.

pub mod dto;
pub mod error;
pub mod handlers;

use crate::application::intake::OrderIntake;
use crate::application::payment::PaymentSelector;
use crate::application::reconciler::WebhookReconciler;
use crate::domain::ports::SharedOrderStore;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use std::sync::Arc;

/// Document scans are the largest bodies the API accepts.
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Shared state handed to every handler; cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub intake: Arc<OrderIntake>,
    pub selector: Arc<PaymentSelector>,
    pub reconciler: Arc<WebhookReconciler>,
    pub store: SharedOrderStore,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/orders", post(handlers::submit_order))
        .route(
            "/orders/payment-method",
            post(handlers::choose_payment_method),
        )
        .route("/orders/{id}", get(handlers::get_order))
        .route("/webhooks/processor", post(handlers::processor_webhook))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}
