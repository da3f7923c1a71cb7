//! Message bodies for the notification channels.

use crate::domain::order::{Locale, Order};

/// Staff-facing summary posted to the messaging bot when an order arrives.
pub fn order_summary(order: &Order) -> String {
    let c = &order.customer;
    let mut lines = vec![
        format!("New order {}", order.id),
        format!("Plan: {}", order.plan_id),
        format!("Name: {}", c.full_name()),
        format!("Birth date: {}", c.birth_date),
        format!("Passport: {} ({})", c.passport_number, c.citizenship),
        format!("Phone: {}", c.phone),
        format!("Email: {}", c.email),
        format!("City: {}", c.city),
        format!(
            "Period: {} .. {} ({} days)",
            order.period.start(),
            order.period.end(),
            order.period.number_of_days()
        ),
        format!("Price: {} {}", order.price, order.currency),
    ];
    let a = &order.attribution;
    if let Some(source) = &a.utm_source {
        lines.push(format!("Source: {source}"));
    }
    if let Some(click_id) = &a.click_id {
        lines.push(format!("Click: {click_id}"));
    }
    lines.join("\n")
}

/// Customer-facing SMS confirming receipt, in the order's locale.
pub fn order_received_sms(order: &Order) -> String {
    match order.locale {
        Locale::En => format!(
            "Thank you! Your order {} for {} {} has been received.",
            order.id, order.price, order.currency
        ),
        Locale::Ka => format!(
            "გმადლობთ! თქვენი შეკვეთა {} ({} {}) მიღებულია.",
            order.id, order.price, order.currency
        ),
        Locale::Ru => format!(
            "Спасибо! Ваш заказ {} на сумму {} {} принят.",
            order.id, order.price, order.currency
        ),
    }
}

pub fn payment_received(order: &Order) -> String {
    let mut text = format!(
        "Payment received for order {}: {} {}",
        order.id, order.price, order.currency
    );
    if let (Some(fee), Some(net)) = (order.processor_fee, order.processor_net_amount) {
        text.push_str(&format!("\nFee: {fee} {0}, net: {net} {0}", order.currency));
    }
    text
}

pub fn payment_failed(order: &Order) -> String {
    format!(
        "Payment failed for order {}: {}",
        order.id,
        order.failure_reason.as_deref().unwrap_or("no reason given")
    )
}

/// Shown to the customer when a card payment did not go through.
pub fn card_payment_failed(locale: Locale) -> &'static str {
    match locale {
        Locale::En => "Your payment did not go through. Choose another method or try the card again.",
        Locale::Ka => "გადახდა ვერ შესრულდა. აირჩიეთ სხვა მეთოდი ან სცადეთ ბარათით ხელახლა.",
        Locale::Ru => "Оплата не прошла. Выберите другой способ или повторите оплату картой.",
    }
}
