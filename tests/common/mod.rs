#![allow(dead_code)]

use async_trait::async_trait;
use policy_desk::application::fanout::NotificationFanout;
use policy_desk::application::intake::OrderIntake;
use policy_desk::application::payment::PaymentSelector;
use policy_desk::application::reconciler::WebhookReconciler;
use policy_desk::domain::catalog::Catalog;
use policy_desk::domain::contact::DomesticNumbering;
use policy_desk::domain::order::{Order, OrderId};
use policy_desk::domain::ports::{CheckoutSession, PaymentProcessor};
use policy_desk::domain::pricing::PricingRules;
use policy_desk::domain::settlement::{BalanceDetail, CurrencyConversion};
use policy_desk::error::Result;
use policy_desk::infrastructure::channels::LogOnlyChannel;
use policy_desk::infrastructure::in_memory::{InMemoryNotificationLog, InMemoryOrderStore};
use policy_desk::infrastructure::signature::{DEFAULT_TOLERANCE_SECS, SignatureVerifier};
use policy_desk::interfaces::http::{AppState, router};
use rust_decimal_macros::dec;
use serde_json::{Value, json};
use std::sync::Arc;

pub const WEBHOOK_SECRET: &str = "whsec_test";

/// Processor double: every checkout gets a fixed URL and every payment
/// settles 1.11 fee / 37.00 net at 0.37.
pub struct StaticProcessor;

#[async_trait]
impl PaymentProcessor for StaticProcessor {
    async fn create_checkout(&self, order: &Order, _return_url: &str) -> Result<CheckoutSession> {
        Ok(CheckoutSession {
            id: format!("cs_{}", order.id),
            url: format!("https://checkout.test/{}", order.id),
        })
    }

    async fn settlement_detail(&self, _payment_intent: &str) -> Result<Option<BalanceDetail>> {
        Ok(Some(BalanceDetail {
            fee: dec!(1.11),
            net: dec!(37.00),
            currency: "usd".to_string(),
            exchange_rate: Some(dec!(0.37)),
        }))
    }
}

pub struct TestApp {
    pub base_url: String,
    pub store: Arc<InMemoryOrderStore>,
    pub notifications: Arc<InMemoryNotificationLog>,
    pub client: reqwest::Client,
}

/// Serves the full router over in-memory stores on an ephemeral port.
pub async fn spawn_app() -> TestApp {
    let store = Arc::new(InMemoryOrderStore::new());
    let notifications = Arc::new(InMemoryNotificationLog::new());
    let catalog = Arc::new(Catalog::default());
    let processor = Arc::new(StaticProcessor);

    let fanout = Arc::new(NotificationFanout::new(
        Arc::new(LogOnlyChannel),
        Arc::new(LogOnlyChannel),
        Arc::new(LogOnlyChannel),
        notifications.clone(),
        DomesticNumbering::default(),
    ));
    let state = AppState {
        intake: Arc::new(OrderIntake::new(
            store.clone(),
            catalog.clone(),
            PricingRules::default(),
            fanout.clone(),
            "TI",
        )),
        selector: Arc::new(PaymentSelector::new(
            store.clone(),
            processor.clone(),
            catalog.settlement_accounts.clone(),
            "https://shop.test/",
        )),
        reconciler: Arc::new(WebhookReconciler::new(
            store.clone(),
            processor,
            SignatureVerifier::new(WEBHOOK_SECRET, DEFAULT_TOLERANCE_SECS),
            fanout,
            CurrencyConversion {
                default_rate: dec!(0.37),
            },
        )),
        store: store.clone(),
    };

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, router(state)).await.unwrap() });

    TestApp {
        base_url: format!("http://{addr}"),
        store,
        notifications,
        client: reqwest::Client::new(),
    }
}

pub fn travel_submission() -> Value {
    json!({
        "planId": "travel-daily",
        "customer": {
            "firstName": "NINO",
            "lastName": "BERIDZE",
            "birthDate": "1990-04-12",
            "passportNumber": "13AB45678",
            "citizenship": "GE",
            "phone": "+995 555 12 34 56",
            "email": "nino@example.ge",
            "city": "Tbilisi"
        },
        "periodStart": "2025-01-01",
        "periodEnd": "2025-01-05",
        "price": "0.01"
    })
}

pub fn checkout_completed(event_id: &str, order_id: &OrderId) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "id": event_id,
        "type": "checkout.session.completed",
        "data": {
            "object": {
                "id": "cs_1",
                "client_reference_id": order_id,
                "metadata": { "order_id": order_id },
                "payment_status": "paid",
                "payment_intent": "pi_1"
            }
        }
    }))
    .unwrap()
}
