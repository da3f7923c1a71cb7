//! HTTP request handlers.
//!
//! Handlers only extract, delegate to the application services held in
//! [`AppState`] and shape the response.

use super::AppState;
use super::dto::*;
use super::error::ApiError;
use crate::domain::order::{OrderId, OrderSubmission};
use crate::infrastructure::signature::SIGNATURE_HEADER;
use axum::Json;
use axum::body::Bytes;
use axum::extract::{Multipart, Path, State};
use axum::http::{HeaderMap, StatusCode};
use tracing::debug;

pub async fn health() -> &'static str {
    "ok"
}

/// Accepts a multipart body with an `order` JSON part and an optional
/// `document` image part.
pub async fn submit_order(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<SubmitResponse>), ApiError> {
    let mut submission: Option<OrderSubmission> = None;
    let mut document: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        match field.name() {
            Some("order") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.to_string()))?;
                let parsed = serde_json::from_str(&text)
                    .map_err(|e| ApiError::BadRequest(format!("invalid order: {e}")))?;
                submission = Some(parsed);
            }
            Some("document") => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.to_string()))?;
                document = Some(bytes.to_vec());
            }
            other => debug!(field = ?other, "ignoring unknown multipart field"),
        }
    }

    let submission =
        submission.ok_or_else(|| ApiError::BadRequest("missing `order` part".to_string()))?;
    let receipt = state.intake.submit(submission, document).await?;
    Ok((
        StatusCode::CREATED,
        Json(SubmitResponse {
            order_id: receipt.order_id,
        }),
    ))
}

pub async fn choose_payment_method(
    State(state): State<AppState>,
    Json(request): Json<PaymentMethodRequest>,
) -> Result<Json<PaymentMethodResponse>, ApiError> {
    let next = state
        .selector
        .select(&request.order_id, request.payment_method)
        .await?;
    Ok(Json(PaymentMethodResponse {
        acknowledged: true,
        next,
    }))
}

pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<OrderView>, ApiError> {
    let id = OrderId::from(id);
    let order = state
        .store
        .get(&id)
        .await?
        .ok_or(crate::error::OrderError::NotFound(id))?;
    Ok(Json(OrderView::from(order)))
}

/// Settlement callbacks. The raw body is needed for signature checking.
pub async fn processor_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, ApiError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());
    state.reconciler.handle(signature, &body).await?;
    Ok(Json(WebhookAck { received: true }))
}
