#![cfg(feature = "storage-rocksdb")]

use assert_cmd::cargo_bin;
use chrono::Utc;
use policy_desk::domain::catalog::Catalog;
use policy_desk::domain::order::{
    Attribution, Customer, Locale, Order, OrderId, OrderStatus, OrderSubmission, OrderUpdate,
    PaymentMethod, SettlementUpdate,
};
use policy_desk::domain::ports::OrderStore;
use policy_desk::domain::pricing::PricingRules;
use policy_desk::infrastructure::rocksdb::RocksDBStore;
use std::process::Command;
use tempfile::tempdir;

fn travel_order(id: &str) -> Order {
    let catalog = Catalog::default();
    let plan = catalog.plan("travel-daily").unwrap();
    let submission = OrderSubmission {
        plan_id: plan.id.clone(),
        customer: Customer {
            first_name: "NINO".to_string(),
            last_name: "BERIDZE".to_string(),
            birth_date: "1990-04-12".parse().unwrap(),
            passport_number: "13AB45678".to_string(),
            citizenship: "GE".to_string(),
            phone: "+995 555 12 34 56".to_string(),
            email: "nino@example.ge".to_string(),
            city: "Tbilisi".to_string(),
        },
        period_start: "2025-01-01".parse().unwrap(),
        period_end: Some("2025-01-05".parse().unwrap()),
        subscription_option: None,
        locale: Locale::En,
        attribution: Attribution::default(),
    };
    Order::create(
        OrderId::from(id),
        submission,
        plan.pricing_model(None).unwrap(),
        &plan.currency,
        &PricingRules::default(),
        false,
        Utc::now(),
    )
    .unwrap()
}

#[tokio::test]
async fn test_rocksdb_persistence_recovery() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("test_db");

    // 1. First session: store an order and settle it
    {
        let store = RocksDBStore::open(&db_path).unwrap();
        let order = travel_order("TI-250101-7QX2KD");
        store.insert(order.clone()).await.unwrap();
        store
            .update(
                &order.id,
                OrderUpdate::Settlement(SettlementUpdate {
                    status: Some(OrderStatus::Paid),
                    payment_method: Some(PaymentMethod::Card),
                    ..Default::default()
                }),
            )
            .await
            .unwrap();
    }

    // 2. Second session: the audit reads the order back from disk
    let output = Command::new(cargo_bin!("policy-desk"))
        .arg("audit")
        .arg("--db-path")
        .arg(&db_path)
        .output()
        .expect("Failed to execute command");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("TI-250101-7QX2KD,travel-daily,paid,card"));
}
