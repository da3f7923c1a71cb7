mod common;

use chrono::Utc;
use common::{WEBHOOK_SECRET, checkout_completed, spawn_app, travel_submission};
use policy_desk::domain::order::{OrderId, OrderStatus, PaymentMethod};
use policy_desk::domain::ports::{NotificationLog, OrderStore};
use policy_desk::infrastructure::signature::{SIGNATURE_HEADER, signature_header};
use reqwest::multipart::{Form, Part};
use rust_decimal_macros::dec;
use serde_json::{Value, json};
use std::time::Duration;

async fn submit(app: &common::TestApp, order: &Value, document: Option<&[u8]>) -> reqwest::Response {
    let mut form = Form::new().text("order", order.to_string());
    if let Some(bytes) = document {
        form = form.part("document", Part::bytes(bytes.to_vec()).file_name("passport.jpg"));
    }
    app.client
        .post(format!("{}/orders", app.base_url))
        .multipart(form)
        .send()
        .await
        .unwrap()
}

async fn submit_ok(app: &common::TestApp) -> OrderId {
    let response = submit(app, &travel_submission(), Some(b"jpeg bytes")).await;
    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.unwrap();
    OrderId::from(body["orderId"].as_str().unwrap())
}

#[tokio::test]
async fn test_health() {
    let app = spawn_app().await;
    let response = app
        .client
        .get(format!("{}/health", app.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "ok");
}

#[tokio::test]
async fn test_submit_prices_on_the_server() {
    let app = spawn_app().await;
    let id = submit_ok(&app).await;
    assert!(id.as_str().starts_with("TI-"));

    let order = app.store.get(&id).await.unwrap().unwrap();
    assert_eq!(order.price, dec!(15));
    assert_eq!(order.status, OrderStatus::Pending);
    assert!(order.has_document);

    let view: Value = app
        .client
        .get(format!("{}/orders/{}", app.base_url, id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(view["status"], "pending");
    assert_eq!(view["price"], "15");
    assert_eq!(view["currency"], "GEL");
    assert_eq!(view["needsReview"], false);
}

#[tokio::test]
async fn test_submit_records_notifications_in_the_background() {
    let app = spawn_app().await;
    let id = submit_ok(&app).await;

    let mut records = Vec::new();
    for _ in 0..50 {
        records = app.notifications.for_order(&id).await.unwrap();
        if records.len() >= 3 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(records.len(), 3, "bot, SMS and email attempts: {records:?}");
}

#[tokio::test]
async fn test_submit_rejections() {
    let app = spawn_app().await;

    let mut short = travel_submission();
    short["periodEnd"] = json!("2025-01-04");
    let response = submit(&app, &short, None).await;
    assert_eq!(response.status(), 422);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("at least 5 days"));

    let mut unknown = travel_submission();
    unknown["planId"] = json!("pet-insurance");
    assert_eq!(submit(&app, &unknown, None).await.status(), 422);

    let response = app
        .client
        .post(format!("{}/orders", app.base_url))
        .multipart(Form::new().text("note", "no order part"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    assert!(app.store.all_orders().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_payment_method_selection() {
    let app = spawn_app().await;
    let id = submit_ok(&app).await;

    let card: Value = app
        .client
        .post(format!("{}/orders/payment-method", app.base_url))
        .json(&json!({ "orderId": id, "paymentMethod": "card" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(card["acknowledged"], true);
    assert_eq!(card["next"]["kind"], "redirect");
    assert_eq!(card["next"]["url"], format!("https://checkout.test/{id}"));

    let bank: Value = app
        .client
        .post(format!("{}/orders/payment-method", app.base_url))
        .json(&json!({ "orderId": id, "paymentMethod": "bank-transfer" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(bank["next"]["kind"], "instructions");

    let order = app.store.get(&id).await.unwrap().unwrap();
    assert_eq!(order.payment_method, Some(PaymentMethod::BankTransfer));

    let missing = app
        .client
        .post(format!("{}/orders/payment-method", app.base_url))
        .json(&json!({ "orderId": "TI-NOPE", "paymentMethod": "crypto" }))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), 404);
}

#[tokio::test]
async fn test_signed_webhook_settles_the_order() {
    let app = spawn_app().await;
    let id = submit_ok(&app).await;
    let body = checkout_completed("evt_1", &id);
    let signature = signature_header(WEBHOOK_SECRET, Utc::now().timestamp(), &body).unwrap();

    for _ in 0..2 {
        let response = app
            .client
            .post(format!("{}/webhooks/processor", app.base_url))
            .header(SIGNATURE_HEADER, &signature)
            .body(body.clone())
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        let ack: Value = response.json().await.unwrap();
        assert_eq!(ack["received"], true);
    }

    let order = app.store.get(&id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Paid);
    assert_eq!(order.payment_method, Some(PaymentMethod::Card));
    assert_eq!(order.processor_fee, Some(dec!(3.00)));
    assert_eq!(order.processor_net_amount, Some(dec!(100.00)));
}

#[tokio::test]
async fn test_unsigned_webhook_is_rejected() {
    let app = spawn_app().await;
    let id = submit_ok(&app).await;
    let body = checkout_completed("evt_1", &id);

    let unsigned = app
        .client
        .post(format!("{}/webhooks/processor", app.base_url))
        .body(body.clone())
        .send()
        .await
        .unwrap();
    assert_eq!(unsigned.status(), 401);

    let forged = signature_header("someone-else", Utc::now().timestamp(), &body).unwrap();
    let response = app
        .client
        .post(format!("{}/webhooks/processor", app.base_url))
        .header(SIGNATURE_HEADER, forged)
        .body(body)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);

    let order = app.store.get(&id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
}

#[tokio::test]
async fn test_unknown_order_is_not_found() {
    let app = spawn_app().await;
    let response = app
        .client
        .get(format!("{}/orders/TI-250101-ZZZZZZ", app.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}
